//! # Direct Accountant
//!
//! Stores up to `max_types` (63) distinct item types, each with its own
//! 64-bit count.
//!
//! ## Inject Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inject(key, count, mode)                                               │
//! │       │                                                                 │
//! │       ├── count <= 0 or policy says no? ───────► return input          │
//! │       │                                                                 │
//! │       ├── new type and 63 types stored? ───────► return input          │
//! │       │     (no partial admission of a brand-new type)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  available = capacity_units - stored_total      (clamped at 0)         │
//! │  to_insert = min(count, available)                                     │
//! │       │                                                                 │
//! │       ├── MODULATE → add (saturating), flush record                    │
//! │       ▼                                                                 │
//! │  to_insert == count ? None : remainder(count - to_insert)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Type Overhead
//! One type's `bytes_per_type` is reserved from the display bytes as soon as
//! the cell holds (or is about to hold) anything, so the unit capacity of a
//! direct cell is `(display_bytes - bytes_per_type) × units_per_byte ×
//! multiplier`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::capacity::{direct_status, CapacityModel};
use crate::cell::{Cell, CellInventory};
use crate::error::CoreResult;
use crate::host::Host;
use crate::math::{add_sat, from_amount, sub_floor, to_amount};
use crate::record::{keys, read_len, read_u64, remove_u64, write_len, write_u64, PersistedRecord};
use crate::types::{
    Actionable, CellKind, CellReport, CellStatus, CellTier, CellVariant, ItemKey, KeyAmount,
};
use crate::MAX_TYPES;

/// Types whose overhead is reserved from the display bytes.
const CHARGED_TYPES: u64 = 1;

/// Inventory view over a direct cell.
pub struct DirectAccountant<'a, R: PersistedRecord> {
    cell: &'a mut Cell<R>,
    host: Host<'a>,
    tier: &'a CellTier,
    max_types: usize,
    capacity: CapacityModel,
    stored: BTreeMap<ItemKey, u64>,
    stored_total: u64,
}

impl<'a, R: PersistedRecord> DirectAccountant<'a, R> {
    /// Binds to `cell` and loads its type records.
    ///
    /// ## Errors
    /// `CoreError::UnknownTier` when the cell's tier is not in `kind`.
    pub fn new(cell: &'a mut Cell<R>, kind: &'a CellKind, host: Host<'a>) -> CoreResult<Self> {
        let tier = kind.tier(cell.tier)?;
        let capacity = CapacityModel::new(tier, host.channel.units_per_byte(), kind.multiplier);
        let stored = load_types(&cell.record);
        let stored_total = stored.values().fold(0, |acc, c| add_sat(acc, *c));

        Ok(DirectAccountant {
            cell,
            host,
            tier,
            max_types: kind.max_types,
            capacity,
            stored,
            stored_total,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Count stored for `key` (0 when absent).
    pub fn stored_count(&self, key: ItemKey) -> u64 {
        self.stored.get(&key).copied().unwrap_or(0)
    }

    pub fn stored_item_count(&self) -> u64 {
        self.stored_total
    }

    pub fn stored_item_types(&self) -> usize {
        self.stored.len()
    }

    pub fn remaining_item_types(&self) -> usize {
        self.max_types.saturating_sub(self.stored.len())
    }

    /// Unit capacity after the type overhead.
    pub fn capacity_units(&self) -> u64 {
        self.capacity.capacity_in_units(CHARGED_TYPES)
    }

    pub fn remaining_item_count(&self) -> u64 {
        sub_floor(self.capacity_units(), self.stored_total)
    }

    pub fn can_hold_new_item(&self) -> bool {
        self.remaining_item_types() > 0 && self.remaining_item_count() > 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.capacity.total_bytes()
    }

    /// Display bytes in use, including the type overhead once non-empty.
    pub fn used_bytes(&self) -> u64 {
        if self.stored_total == 0 && self.stored.is_empty() {
            return 0;
        }
        add_sat(
            self.capacity.overhead_bytes(CHARGED_TYPES),
            self.capacity.used_bytes(self.stored_total),
        )
    }

    pub fn free_bytes(&self) -> u64 {
        sub_floor(self.total_bytes(), self.used_bytes())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn flush(&mut self) {
        let record = &mut self.cell.record;
        let previous = read_len(record, keys::TYPES);

        write_len(record, keys::TYPES, self.stored.len());
        for (index, (key, count)) in self.stored.iter().enumerate() {
            record.put_int(&keys::type_key(index), key.to_field());
            write_u64(record, &keys::type_count(index), *count);
        }
        for index in self.stored.len()..previous {
            record.remove(&keys::type_key(index));
            remove_u64(record, &keys::type_count(index));
        }
        write_u64(record, keys::STORED_COUNT, self.stored_total);
    }
}

fn load_types<R: PersistedRecord>(record: &R) -> BTreeMap<ItemKey, u64> {
    let mut declared = read_len(record, keys::TYPES);
    if declared > MAX_TYPES {
        warn!(declared, max = MAX_TYPES, "Direct cell record declares too many types");
        declared = MAX_TYPES;
    }

    let mut stored = BTreeMap::new();
    for index in 0..declared {
        let Some(raw) = record.get_int(&keys::type_key(index)) else {
            continue;
        };
        let count = read_u64(record, &keys::type_count(index));
        if count == 0 {
            continue;
        }
        let slot = stored.entry(ItemKey::from_field(raw)).or_insert(0);
        *slot = add_sat(*slot, count);
    }
    stored
}

// =============================================================================
// Inventory
// =============================================================================

impl<'a, R: PersistedRecord> CellInventory for DirectAccountant<'a, R> {
    fn inject(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount> {
        if what.amount <= 0
            || !self
                .host
                .policy
                .is_allowed(what.key, &self.cell.partition, self.cell.upgrades)
        {
            return Some(what);
        }

        let is_new_type = self.stored_count(what.key) == 0;
        if is_new_type && self.stored.len() >= self.max_types {
            return Some(what);
        }

        let requested = from_amount(what.amount);
        let to_insert = requested.min(self.remaining_item_count());
        if to_insert == 0 {
            return Some(what);
        }

        if mode.is_modulate() {
            let slot = self.stored.entry(what.key).or_insert(0);
            *slot = add_sat(*slot, to_insert);
            self.stored_total = add_sat(self.stored_total, to_insert);
            self.flush();
            debug!(
                key = %what.key,
                inserted = to_insert,
                stored_total = self.stored_total,
                types = self.stored.len(),
                "Injected into direct cell"
            );
        }

        if to_insert == requested {
            None
        } else {
            Some(what.with_amount(to_amount(requested - to_insert)))
        }
    }

    fn extract(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount> {
        if what.amount <= 0 {
            return None;
        }

        let existing = self.stored_count(what.key);
        if existing == 0 {
            return None;
        }

        let to_extract = from_amount(what.amount).min(existing);

        if mode.is_modulate() {
            let left = existing - to_extract;
            if left == 0 {
                self.stored.remove(&what.key);
            } else {
                self.stored.insert(what.key, left);
            }
            self.stored_total = sub_floor(self.stored_total, to_extract);
            self.flush();
            debug!(
                key = %what.key,
                extracted = to_extract,
                stored_total = self.stored_total,
                "Extracted from direct cell"
            );
        }

        Some(what.with_amount(to_amount(to_extract)))
    }

    fn stored_quantity(&self, key: ItemKey) -> u64 {
        self.stored_count(key)
    }

    fn available_stacks(&self) -> Vec<KeyAmount> {
        self.stored
            .iter()
            .map(|(key, count)| KeyAmount::new(*key, to_amount(*count)))
            .collect()
    }

    fn status(&self) -> CellStatus {
        direct_status(
            self.stored_total,
            self.stored.len(),
            self.max_types,
            self.remaining_item_count(),
        )
    }

    fn report(&self) -> CellReport {
        CellReport {
            variant: CellVariant::Direct,
            tier_label: self.tier.label.clone(),
            status: self.status(),
            total_bytes: self.total_bytes(),
            used_bytes: self.used_bytes(),
            free_bytes: self.free_bytes(),
            stored_types: self.stored_item_types(),
            max_types: self.max_types,
            stored_count: self.stored_total,
            remaining_count: self.remaining_item_count(),
            stacks: self.available_stacks(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
