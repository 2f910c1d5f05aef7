//! # megacell-core: Storage-Cell Accounting
//!
//! This crate tracks how much of which item type a storage cell holds, under
//! a capacity that can be multiplied far past 64 bits before it saturates.
//! All logic is pure: the host hands in a record to persist into, plus a few
//! collaborators, and gets back plain values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MegaCell Workspace                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ megacell-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   math    │  │ capacity  │  │  record   │  │   host    │  │   │
//! │  │   │ saturating│  │  display  │  │  hi / lo  │  │  traits   │  │   │
//! │  │   │ arithmetic│  │ vs actual │  │  fields   │  │ + Host<'a>│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────────┐   ┌──────────────────────────────┐    │   │
//! │  │   │  direct            │   │  compacting                  │    │   │
//! │  │   │  ≤ 63 types        │   │  ≤ 3 tiers, 1 base counter   │    │   │
//! │  │   └────────────────────┘   └──────────────────────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO GLOBALS                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            megacell-store (SQLite cells, config, seed)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`math`] - Saturating u64 arithmetic
//! - [`capacity`] - Display-scale vs actual-scale capacity
//! - [`record`] - Persisted record trait and the hi/lo u64 codec
//! - [`host`] - Host collaborator traits and reference implementations
//! - [`cell`] - Cell state and the shared inventory interface
//! - [`direct`] - Per-type accountant
//! - [`compacting`] - Compression-chain accountant
//! - [`decompose`] - Recipe-table decomposer
//! - [`validation`] - Configuration checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use megacell_core::{
//!     Actionable, Cell, CellInventory, CellKind, DirectAccountant, Host, ItemChannel, ItemKey,
//!     KeyAmount, PartitionPolicy, TagRecord,
//! };
//!
//! let kind = CellKind::standard();
//! let channel = ItemChannel::default();
//! let policy = PartitionPolicy;
//! let mut cell: Cell<TagRecord> = Cell::new(0);
//!
//! let mut inv = DirectAccountant::new(&mut cell, &kind, Host::new(&channel, &policy)).unwrap();
//! let cobble = ItemKey::new(4);
//!
//! // A 1k cell with the default multiplier takes a lot of cobblestone
//! let trillion = 1_000_000_000_000;
//! assert_eq!(inv.inject(KeyAmount::new(cobble, trillion), Actionable::Modulate), None);
//! assert_eq!(inv.stored_count(cobble), trillion as u64);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capacity;
pub mod cell;
pub mod compacting;
pub mod decompose;
pub mod direct;
pub mod error;
pub mod host;
pub mod math;
pub mod record;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cell::{open_cell, Cell, CellInventory};
pub use compacting::{ChainOutcome, CompactingAccountant};
pub use decompose::RecipeDecomposer;
pub use direct::DirectAccountant;
pub use error::{CoreError, CoreResult, ValidationError};
pub use host::{AlterationListener, Channel, Decomposer, Host, ItemChannel, MatchPolicy, PartitionPolicy};
pub use record::{PersistedRecord, TagRecord};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Distinct item types a direct cell can hold.
pub const MAX_TYPES: usize = 63;

/// Tiers in a compression chain.
pub const MAX_CHAIN_TIERS: usize = 3;

/// Default secret capacity multiplier (2^40).
///
/// A 1k cell at 8 items per byte already holds about 9 × 10^15 items, so
/// most arithmetic on real cells runs close to the saturation ceiling.
pub const DEFAULT_MULTIPLIER: u64 = 1 << 40;
