//! # Compacting Accountant
//!
//! Stores one item family as a single base-unit counter. Every tier of the
//! compression chain is a view over that counter: the quantity at tier `i` is
//! `stored_base_units / rate_i`, so inserting 9 nuggets makes 1 ingot appear
//! without any conversion step.
//!
//! ## Chain & Counter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  chain:   [ nugget ×1 ]   [ ingot ×9 ]   [ block ×81 ]                  │
//! │                 ▲               ▲               ▲                       │
//! │                 └───────────────┼───────────────┘                       │
//! │                        stored_base_units = 90                           │
//! │                                                                         │
//! │  quantity_at_tier(0) = 90   quantity_at_tier(1) = 10                    │
//! │  quantity_at_tier(2) = 1                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partition Lock
//! The chain is derived from the partition's first entry. While the counter
//! is nonzero the chain cannot change: a partition edit is reverted to the
//! cached partition the next time the chain is derived, and the revert is
//! reported as [`ChainOutcome::Reverted`].
//!
//! ## Notifications
//! Any mutation also changes the visible quantity of the other tiers. Those
//! deltas are sent to the host's listener as one batch per operation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capacity::CapacityModel;
use crate::cell::{Cell, CellInventory};
use crate::error::CoreResult;
use crate::host::Host;
use crate::math::{add_sat, ceil_div, from_amount, mul_sat, signed_delta, sub_floor, to_amount};
use crate::record::{keys, read_len, read_u64, write_len, write_u64, PersistedRecord};
use crate::types::{
    Actionable, CellKind, CellReport, CellStatus, CellTier, CellVariant, CompressionTier, ItemKey,
    KeyAmount, PartitionConfig,
};
use crate::{MAX_CHAIN_TIERS, MAX_TYPES};

/// What a chain derivation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOutcome {
    /// Partition matches the cached partition; nothing to do.
    Unchanged,
    /// Partition emptied while the cell was empty; chain unbound.
    Cleared,
    /// New chain bound from the partition's first entry.
    Rebuilt,
    /// Cell holds content; the partition was restored to the cached value.
    Reverted,
}

/// Inventory view over a compacting cell.
pub struct CompactingAccountant<'a, R: PersistedRecord> {
    cell: &'a mut Cell<R>,
    host: Host<'a>,
    tier: &'a CellTier,
    capacity: CapacityModel,
    chain: Vec<CompressionTier>,
    main_tier: usize,
    stored_base_units: u64,
    cached_partition: PartitionConfig,
}

impl<'a, R: PersistedRecord> CompactingAccountant<'a, R> {
    /// Binds to `cell` and loads its counter, chain and cached partition.
    ///
    /// The chain is not re-derived here; that happens lazily on the first
    /// inject or extract, or through [`derive_chain`](Self::derive_chain).
    pub fn new(cell: &'a mut Cell<R>, kind: &'a CellKind, host: Host<'a>) -> CoreResult<Self> {
        let tier = kind.tier(cell.tier)?;
        let capacity = CapacityModel::new(tier, host.channel.units_per_byte(), kind.multiplier);

        let record = &cell.record;
        let stored_base_units = read_u64(record, keys::STORED_BASE_UNITS);
        let chain = load_chain(record);
        let mut main_tier = read_len(record, keys::MAIN_TIER);
        if main_tier >= chain.len() {
            main_tier = 0;
        }
        let cached_partition = load_cached_partition(record);

        Ok(CompactingAccountant {
            cell,
            host,
            tier,
            capacity,
            chain,
            main_tier,
            stored_base_units,
            cached_partition,
        })
    }

    // =========================================================================
    // Chain
    // =========================================================================

    /// Re-derives the chain if the partition changed, and persists the result.
    pub fn derive_chain(&mut self) -> ChainOutcome {
        self.ensure_chain(true)
    }

    /// True when the partition differs from the one the chain was built for.
    pub fn needs_derivation(&self) -> bool {
        self.cell.partition != self.cached_partition
    }

    fn ensure_chain(&mut self, persist: bool) -> ChainOutcome {
        if !self.needs_derivation() {
            return ChainOutcome::Unchanged;
        }

        if self.stored_base_units > 0 {
            warn!(
                stored_base_units = self.stored_base_units,
                "Partition changed on a non-empty compacting cell; reverting"
            );
            self.cell.partition = self.cached_partition.clone();
            return ChainOutcome::Reverted;
        }

        let outcome = match self.cell.partition.first() {
            None => {
                self.chain.clear();
                self.main_tier = 0;
                self.cached_partition.clear();
                ChainOutcome::Cleared
            }
            Some(seed) => {
                let mut chain = self
                    .host
                    .decomposer
                    .map(|d| d.decompose(seed))
                    .unwrap_or_default();
                chain.retain(|t| t.rate > 0);
                chain.truncate(MAX_CHAIN_TIERS);
                if chain.is_empty() {
                    chain.push(CompressionTier::new(seed, 1));
                }

                self.main_tier = chain.iter().position(|t| t.prototype == seed).unwrap_or(0);
                self.chain = chain;
                self.cached_partition = self.cell.partition.clone();
                ChainOutcome::Rebuilt
            }
        };

        debug!(
            ?outcome,
            tiers = self.chain.len(),
            main_tier = self.main_tier,
            "Derived compression chain"
        );
        if persist {
            self.flush();
        }
        outcome
    }

    pub fn chain(&self) -> &[CompressionTier] {
        &self.chain
    }

    pub fn main_tier(&self) -> usize {
        self.main_tier
    }

    fn main_rate(&self) -> u64 {
        self.chain.get(self.main_tier).map_or(1, |t| u64::from(t.rate))
    }

    fn tier_index(&self, key: ItemKey) -> Option<usize> {
        self.chain.iter().position(|t| t.prototype == key)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn stored_base_units(&self) -> u64 {
        self.stored_base_units
    }

    /// Quantity visible at tier `index`; 0 for an unbound index.
    pub fn quantity_at_tier(&self, index: usize) -> u64 {
        match self.chain.get(index) {
            Some(tier) if tier.rate > 0 => self.stored_base_units / u64::from(tier.rate),
            _ => 0,
        }
    }

    /// Base-unit capacity, overhead included once the chain is bound.
    pub fn capacity_base_units(&self) -> u64 {
        let charged = u64::from(!self.chain.is_empty());
        mul_sat(self.capacity.capacity_in_units(charged), self.main_rate())
    }

    /// Room left, in main-tier units.
    pub fn remaining_item_count(&self) -> u64 {
        sub_floor(self.capacity_base_units(), self.stored_base_units) / self.main_rate()
    }

    pub fn total_bytes(&self) -> u64 {
        self.capacity.total_bytes()
    }

    pub fn used_bytes(&self) -> u64 {
        if self.stored_base_units == 0 {
            return 0;
        }
        let main_units = ceil_div(self.stored_base_units, self.main_rate());
        add_sat(self.capacity.overhead_bytes(1), self.capacity.used_bytes(main_units))
    }

    pub fn free_bytes(&self) -> u64 {
        sub_floor(self.total_bytes(), self.used_bytes())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn flush(&mut self) {
        let record = &mut self.cell.record;
        write_u64(record, keys::STORED_BASE_UNITS, self.stored_base_units);

        let previous = read_len(record, keys::CHAIN_TIERS);
        write_len(record, keys::CHAIN_TIERS, self.chain.len());
        for (index, tier) in self.chain.iter().enumerate() {
            record.put_int(&keys::tier_key(index), tier.prototype.to_field());
            record.put_int(&keys::tier_rate(index), tier.rate as i32);
        }
        for index in self.chain.len()..previous {
            record.remove(&keys::tier_key(index));
            record.remove(&keys::tier_rate(index));
        }
        write_len(record, keys::MAIN_TIER, self.main_tier);

        let previous = read_len(record, keys::CACHED_PARTITION);
        let entries = self.cached_partition.keys();
        write_len(record, keys::CACHED_PARTITION, entries.len());
        for (index, key) in entries.iter().enumerate() {
            record.put_int(&keys::cached_partition_entry(index), key.to_field());
        }
        for index in entries.len()..previous {
            record.remove(&keys::cached_partition_entry(index));
        }
    }

    /// Sends the visible-quantity change of every tier except `operated`.
    fn notify_others(&self, operated: usize, old: u64) {
        let changes: Vec<KeyAmount> = self
            .chain
            .iter()
            .enumerate()
            .filter(|(index, tier)| *index != operated && tier.rate > 0)
            .filter_map(|(_, tier)| {
                let rate = u64::from(tier.rate);
                let before = old / rate;
                let after = self.stored_base_units / rate;
                (before != after).then(|| KeyAmount::new(tier.prototype, signed_delta(before, after)))
            })
            .collect();
        self.host.notify(&changes);
    }
}

fn load_chain<R: PersistedRecord>(record: &R) -> Vec<CompressionTier> {
    let declared = read_len(record, keys::CHAIN_TIERS).min(MAX_CHAIN_TIERS);
    (0..declared)
        .filter_map(|index| {
            let key = record.get_int(&keys::tier_key(index))?;
            // rates are stored as raw u32 bits
            let rate = record.get_int(&keys::tier_rate(index)).unwrap_or(0) as u32;
            if rate == 0 {
                warn!(index, "Dropping compression tier with zero rate");
                return None;
            }
            Some(CompressionTier::new(ItemKey::from_field(key), rate))
        })
        .collect()
}

fn load_cached_partition<R: PersistedRecord>(record: &R) -> PartitionConfig {
    let declared = read_len(record, keys::CACHED_PARTITION).min(MAX_TYPES);
    PartitionConfig::from_keys(
        (0..declared)
            .filter_map(|index| record.get_int(&keys::cached_partition_entry(index)))
            .map(ItemKey::from_field),
    )
}

// =============================================================================
// Inventory
// =============================================================================

impl<'a, R: PersistedRecord> CellInventory for CompactingAccountant<'a, R> {
    fn inject(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount> {
        if what.amount <= 0 || self.cell.partition.is_empty() {
            return Some(what);
        }

        self.ensure_chain(mode.is_modulate());

        let Some(index) = self.tier_index(what.key) else {
            return Some(what);
        };
        // The partition names the family seed, so admission is judged on the
        // main tier's prototype rather than the candidate's own key.
        let seed = self.chain.get(self.main_tier).map_or(what.key, |t| t.prototype);
        if !self
            .host
            .policy
            .is_allowed(seed, &self.cell.partition, self.cell.upgrades)
        {
            return Some(what);
        }

        let rate = u64::from(self.chain[index].rate);
        let count = from_amount(what.amount);
        let requested = mul_sat(count, rate);
        let remaining = sub_floor(self.capacity_base_units(), self.stored_base_units);
        let insertable = requested.min(remaining) / rate;
        let void = self.cell.upgrades.overflow_void;

        if insertable == 0 {
            return if void { None } else { Some(what) };
        }

        if mode.is_modulate() {
            let old = self.stored_base_units;
            self.stored_base_units = add_sat(old, mul_sat(insertable, rate));
            self.flush();
            debug!(
                key = %what.key,
                inserted = insertable,
                stored_base_units = self.stored_base_units,
                "Injected into compacting cell"
            );
            self.notify_others(index, old);
        }

        if insertable == count || void {
            None
        } else {
            Some(what.with_amount(to_amount(count - insertable)))
        }
    }

    fn extract(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount> {
        if what.amount <= 0 {
            return None;
        }

        self.ensure_chain(mode.is_modulate());

        let index = self.tier_index(what.key)?;
        let to_extract = from_amount(what.amount).min(self.quantity_at_tier(index));
        if to_extract == 0 {
            return None;
        }

        if mode.is_modulate() {
            let rate = u64::from(self.chain[index].rate);
            let old = self.stored_base_units;
            self.stored_base_units = sub_floor(old, mul_sat(to_extract, rate));
            self.flush();
            debug!(
                key = %what.key,
                extracted = to_extract,
                stored_base_units = self.stored_base_units,
                "Extracted from compacting cell"
            );
            self.notify_others(index, old);
        }

        Some(what.with_amount(to_amount(to_extract)))
    }

    fn stored_quantity(&self, key: ItemKey) -> u64 {
        self.tier_index(key)
            .map_or(0, |index| self.quantity_at_tier(index))
    }

    fn available_stacks(&self) -> Vec<KeyAmount> {
        self.chain
            .iter()
            .enumerate()
            .filter_map(|(index, tier)| {
                let quantity = self.quantity_at_tier(index);
                (quantity > 0).then(|| KeyAmount::new(tier.prototype, to_amount(quantity)))
            })
            .collect()
    }

    fn status(&self) -> CellStatus {
        let remaining = self.remaining_item_count();
        if self.used_bytes() == 0 {
            CellStatus::Empty
        } else if self.chain.is_empty() && remaining > 0 {
            CellStatus::HasRoomForNewType
        } else if remaining > 0 {
            CellStatus::HasRoomForMore
        } else {
            CellStatus::Full
        }
    }

    fn report(&self) -> CellReport {
        CellReport {
            variant: CellVariant::Compacting,
            tier_label: self.tier.label.clone(),
            status: self.status(),
            total_bytes: self.total_bytes(),
            used_bytes: self.used_bytes(),
            free_bytes: self.free_bytes(),
            stored_types: usize::from(self.stored_base_units > 0),
            max_types: 1,
            stored_count: self.quantity_at_tier(self.main_tier),
            remaining_count: self.remaining_item_count(),
            stacks: self.available_stacks(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
