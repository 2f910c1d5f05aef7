//! # Cell & Inventory Interface
//!
//! A [`Cell`] is the host-owned state of one storage cell: its tier index,
//! its persisted record, its partition and its upgrade flags. Accountants
//! borrow a cell mutably for as long as a caller needs an inventory view, and
//! are dropped afterwards. They own nothing that outlives the borrow.
//!
//! ## Lifecycle
//! ```text
//! host asks for inventory ──► open_cell(variant, &mut cell, kind, host)
//!                                   │  loads counters from cell.record
//!                                   ▼
//!                        inject / extract / status ...
//!                                   │  MODULATE flushes into cell.record
//!                                   ▼
//!                              view dropped
//! ```

use serde::{Deserialize, Serialize};

use crate::compacting::CompactingAccountant;
use crate::direct::DirectAccountant;
use crate::error::CoreResult;
use crate::host::Host;
use crate::record::PersistedRecord;
use crate::types::{
    Actionable, CellKind, CellReport, CellStatus, CellVariant, ItemKey, KeyAmount, PartitionConfig,
    UpgradeFlags,
};

// =============================================================================
// Cell
// =============================================================================

/// Host-side state of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell<R> {
    /// Index into the kind's tier table.
    pub tier: usize,

    pub record: R,

    #[serde(default)]
    pub partition: PartitionConfig,

    #[serde(default)]
    pub upgrades: UpgradeFlags,
}

impl<R: Default> Cell<R> {
    /// A blank cell of the given tier.
    pub fn new(tier: usize) -> Self {
        Cell {
            tier,
            record: R::default(),
            partition: PartitionConfig::default(),
            upgrades: UpgradeFlags::default(),
        }
    }
}

impl<R> Cell<R> {
    /// Wraps an existing record.
    pub fn with_record(tier: usize, record: R) -> Self {
        Cell {
            tier,
            record,
            partition: PartitionConfig::default(),
            upgrades: UpgradeFlags::default(),
        }
    }

    pub fn with_partition(mut self, partition: PartitionConfig) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_upgrades(mut self, upgrades: UpgradeFlags) -> Self {
        self.upgrades = upgrades;
        self
    }
}

// =============================================================================
// Inventory Interface
// =============================================================================

/// Operations shared by both accountants.
///
/// Amounts `<= 0` are never admitted. Rejections are ordinary return values.
pub trait CellInventory {
    /// Inserts `what`; returns the part that did not fit, or `None` when
    /// everything was absorbed.
    fn inject(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount>;

    /// Removes up to `what.amount`; returns what was (or would be) removed,
    /// or `None` when nothing matches.
    fn extract(&mut self, what: KeyAmount, mode: Actionable) -> Option<KeyAmount>;

    /// Quantity currently visible for `key`.
    fn stored_quantity(&self, key: ItemKey) -> u64;

    /// Every visible (key, amount) pair with a nonzero amount.
    fn available_stacks(&self) -> Vec<KeyAmount>;

    fn status(&self) -> CellStatus;

    fn report(&self) -> CellReport;
}

/// Opens the accountant matching `variant` over `cell`.
///
/// ## Example
/// ```rust
/// use megacell_core::cell::{open_cell, Cell, CellInventory};
/// use megacell_core::host::{Host, ItemChannel, PartitionPolicy};
/// use megacell_core::record::TagRecord;
/// use megacell_core::types::{Actionable, CellKind, CellStatus, CellVariant, ItemKey, KeyAmount};
///
/// let kind = CellKind::standard();
/// let channel = ItemChannel::default();
/// let policy = PartitionPolicy;
/// let mut cell: Cell<TagRecord> = Cell::new(0);
///
/// let mut inv = open_cell(CellVariant::Direct, &mut cell, &kind, Host::new(&channel, &policy)).unwrap();
/// assert_eq!(inv.inject(KeyAmount::new(ItemKey::new(1), 64), Actionable::Modulate), None);
/// assert_eq!(inv.status(), CellStatus::HasRoomForNewType);
/// ```
pub fn open_cell<'a, R: PersistedRecord + 'a>(
    variant: CellVariant,
    cell: &'a mut Cell<R>,
    kind: &'a CellKind,
    host: Host<'a>,
) -> CoreResult<Box<dyn CellInventory + 'a>> {
    let inventory: Box<dyn CellInventory + 'a> = match variant {
        CellVariant::Direct => Box::new(DirectAccountant::new(cell, kind, host)?),
        CellVariant::Compacting => Box::new(CompactingAccountant::new(cell, kind, host)?),
    };
    Ok(inventory)
}
