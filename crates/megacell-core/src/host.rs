//! # Host Collaborators
//!
//! The accountants never reach for global registries. Everything they need
//! from the host is passed in through [`Host`] at construction time.
//!
//! ## Collaborator Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Host<'a>                                       │
//! │                                                                         │
//! │  channel     : &dyn Channel              units per capacity byte       │
//! │  policy      : &dyn MatchPolicy          partition admission           │
//! │  decomposer  : Option<&dyn Decomposer>   compression chain lookup      │
//! │  listener    : Option<&dyn AlterationListener>  implicit deltas        │
//! │                                                                         │
//! │  No decomposer → trivial single-tier chain (rate 1)                    │
//! │  No listener   → notifications are skipped, nothing else changes       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::types::{CompressionTier, ItemKey, KeyAmount, PartitionConfig, UpgradeFlags};

// =============================================================================
// Traits
// =============================================================================

/// Defines how many content units fit in one capacity byte.
pub trait Channel {
    fn units_per_byte(&self) -> u64;
}

/// Decides whether an item type may enter a cell.
pub trait MatchPolicy {
    fn is_allowed(&self, key: ItemKey, partition: &PartitionConfig, upgrades: UpgradeFlags) -> bool;
}

/// Produces a compression chain for a seed item.
pub trait Decomposer {
    /// Up to three tiers ordered from the finest (lowest rate) upward.
    /// An empty result means the seed has no known compression family.
    fn decompose(&self, seed: ItemKey) -> Vec<CompressionTier>;
}

/// Receives quantity changes the caller did not directly request.
pub trait AlterationListener {
    fn on_quantities_changed(&self, changes: &[KeyAmount]);
}

// =============================================================================
// Reference Implementations
// =============================================================================

/// The item channel: 8 items per byte unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemChannel {
    units_per_byte: u64,
}

impl ItemChannel {
    pub const DEFAULT_UNITS_PER_BYTE: u64 = 8;

    pub const fn new(units_per_byte: u64) -> Self {
        ItemChannel { units_per_byte }
    }
}

impl Default for ItemChannel {
    fn default() -> Self {
        ItemChannel::new(Self::DEFAULT_UNITS_PER_BYTE)
    }
}

impl Channel for ItemChannel {
    fn units_per_byte(&self) -> u64 {
        self.units_per_byte
    }
}

/// Exact-match partition policy.
///
/// ## Rules
/// - Empty partition: everything is admitted
/// - Otherwise: `contains(key) != inverted`
///
/// Keys carry no variant data, so the fuzzy flag has nothing to widen here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionPolicy;

impl MatchPolicy for PartitionPolicy {
    fn is_allowed(&self, key: ItemKey, partition: &PartitionConfig, upgrades: UpgradeFlags) -> bool {
        if partition.is_empty() {
            return true;
        }
        partition.contains(key) != upgrades.inverted
    }
}

// =============================================================================
// Host Bundle
// =============================================================================

/// Collaborators handed to an accountant.
///
/// ## Usage
/// ```rust
/// use megacell_core::host::{Host, ItemChannel, PartitionPolicy};
///
/// let channel = ItemChannel::default();
/// let policy = PartitionPolicy;
/// let host = Host::new(&channel, &policy);
/// assert!(host.decomposer.is_none());
/// ```
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub channel: &'a dyn Channel,
    pub policy: &'a dyn MatchPolicy,
    pub decomposer: Option<&'a dyn Decomposer>,
    pub listener: Option<&'a dyn AlterationListener>,
}

impl<'a> Host<'a> {
    pub fn new(channel: &'a dyn Channel, policy: &'a dyn MatchPolicy) -> Self {
        Host {
            channel,
            policy,
            decomposer: None,
            listener: None,
        }
    }

    pub fn with_decomposer(mut self, decomposer: &'a dyn Decomposer) -> Self {
        self.decomposer = Some(decomposer);
        self
    }

    pub fn with_listener(mut self, listener: &'a dyn AlterationListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sends a batch to the listener, if there is one and the batch is non-empty.
    pub(crate) fn notify(&self, changes: &[KeyAmount]) {
        if changes.is_empty() {
            return;
        }
        if let Some(listener) = self.listener {
            listener.on_quantities_changed(changes);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
