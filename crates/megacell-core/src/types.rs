//! # Domain Types
//!
//! Core domain types shared by both accountants.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CellKind     │   │    CellTier     │   │ CompressionTier │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  multiplier     │──►│  display_bytes  │   │  prototype      │       │
//! │  │  max_types      │   │  bytes_per_type │   │  rate (u32)     │       │
//! │  │  tiers[]        │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    ItemKey      │   │   KeyAmount     │   │   CellStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  u32 registry id│   │  key            │   │  Empty          │       │
//! │  └─────────────────┘   │  amount (i64)   │   │  HasRoomForNew… │       │
//! │                        └─────────────────┘   │  HasRoomForMore │       │
//! │                                              │  Full           │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Signed vs Unsigned
//! Amounts crossing the host boundary are `i64` (the host's native amount
//! type, where `<= 0` means "nothing"). Counters held by the accountants are
//! `u64` and only ever change through [`crate::math`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_MULTIPLIER, MAX_TYPES};

// =============================================================================
// Item Identity
// =============================================================================

/// Opaque item-type identity (a host registry id).
///
/// Persisted bit-exactly as one 32-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey(u32);

impl ItemKey {
    /// Creates a key from a registry id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        ItemKey(id)
    }

    /// Returns the registry id.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    /// Reinterprets the id as the host's 32-bit signed field value.
    #[inline]
    pub const fn to_field(self) -> i32 {
        self.0 as i32
    }

    /// Rebuilds a key from a 32-bit signed field value.
    #[inline]
    pub const fn from_field(field: i32) -> Self {
        ItemKey(field as u32)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// An item type paired with a host-side amount.
///
/// Used for inject candidates, remainders, extracted results and listener
/// deltas (where the amount may be negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyAmount {
    pub key: ItemKey,
    pub amount: i64,
}

impl KeyAmount {
    #[inline]
    pub const fn new(key: ItemKey, amount: i64) -> Self {
        KeyAmount { key, amount }
    }

    /// Same key, different amount.
    #[inline]
    pub const fn with_amount(&self, amount: i64) -> Self {
        KeyAmount {
            key: self.key,
            amount,
        }
    }
}

// =============================================================================
// Operation Mode
// =============================================================================

/// Whether an operation commits its mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actionable {
    /// Compute the result without mutating anything.
    Simulate,
    /// Commit the mutation and flush the persisted record.
    Modulate,
}

impl Actionable {
    #[inline]
    pub const fn is_modulate(&self) -> bool {
        matches!(self, Actionable::Modulate)
    }
}

// =============================================================================
// Cell Status
// =============================================================================

/// Coarse fill state, as shown on drive indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Empty,
    HasRoomForNewType,
    HasRoomForMore,
    Full,
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellStatus::Empty => write!(f, "empty"),
            CellStatus::HasRoomForNewType => write!(f, "has_room_for_new_type"),
            CellStatus::HasRoomForMore => write!(f, "has_room_for_more"),
            CellStatus::Full => write!(f, "full"),
        }
    }
}

/// Which accountant a stored cell is read through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellVariant {
    #[default]
    Direct,
    Compacting,
}

impl fmt::Display for CellVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellVariant::Direct => write!(f, "direct"),
            CellVariant::Compacting => write!(f, "compacting"),
        }
    }
}

impl std::str::FromStr for CellVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(CellVariant::Direct),
            "compacting" | "compression" => Ok(CellVariant::Compacting),
            other => Err(format!(
                "Unknown cell variant: '{}'. Valid options: direct, compacting",
                other
            )),
        }
    }
}

// =============================================================================
// Upgrades & Partition
// =============================================================================

/// Flags sourced from upgrade tokens installed in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpgradeFlags {
    /// Fuzzy matching requested (interpreted by the match policy).
    #[serde(default)]
    pub fuzzy: bool,

    /// Partition acts as a block-list instead of an allow-list.
    #[serde(default)]
    pub inverted: bool,

    /// Excess that does not fit is accepted and destroyed.
    #[serde(default)]
    pub overflow_void: bool,
}

/// Ordered list of item-type filter entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionConfig {
    entries: Vec<ItemKey>,
}

impl PartitionConfig {
    /// Creates an empty partition (accepts anything).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = ItemKey>) -> Self {
        PartitionConfig {
            entries: keys.into_iter().collect(),
        }
    }

    /// First configured entry; seeds compression-chain derivation.
    pub fn first(&self) -> Option<ItemKey> {
        self.entries.first().copied()
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.entries.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> &[ItemKey] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// Cell Kind & Tier Table
// =============================================================================

/// One row of a kind's tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTier {
    /// Label shown to players ("1k", "4k", ...).
    pub label: String,

    /// Displayed capacity in bytes, before the multiplier.
    pub display_bytes: u64,

    /// Displayed bytes consumed by one stored type.
    pub bytes_per_type: u64,
}

impl CellTier {
    pub fn new(label: impl Into<String>, display_bytes: u64, bytes_per_type: u64) -> Self {
        CellTier {
            label: label.into(),
            display_bytes,
            bytes_per_type,
        }
    }
}

/// Engine constants shared by every cell of one kind.
///
/// ## Example Config Section
/// ```toml
/// [cell]
/// name = "mega_item"
/// multiplier = 1099511627776
/// max_types = 63
///
/// [[cell.tiers]]
/// label = "1k"
/// display_bytes = 1024
/// bytes_per_type = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellKind {
    pub name: String,

    /// Secret factor applied on top of the displayed capacity.
    pub multiplier: u64,

    /// Distinct-type ceiling for direct cells.
    #[serde(default = "default_max_types")]
    pub max_types: usize,

    pub tiers: Vec<CellTier>,
}

fn default_max_types() -> usize {
    MAX_TYPES
}

impl CellKind {
    /// The standard 1k..256k tier table with the default multiplier.
    pub fn standard() -> Self {
        CellKind {
            name: "mega_item".to_string(),
            multiplier: DEFAULT_MULTIPLIER,
            max_types: MAX_TYPES,
            tiers: vec![
                CellTier::new("1k", 1_024, 8),
                CellTier::new("4k", 4_096, 32),
                CellTier::new("16k", 16_384, 128),
                CellTier::new("64k", 65_536, 512),
                CellTier::new("256k", 262_144, 2_048),
            ],
        }
    }

    /// Looks up a tier by index.
    pub fn tier(&self, index: usize) -> CoreResult<&CellTier> {
        self.tiers.get(index).ok_or(CoreError::UnknownTier {
            tier: index,
            available: self.tiers.len(),
        })
    }
}

impl Default for CellKind {
    fn default() -> Self {
        CellKind::standard()
    }
}

// =============================================================================
// Compression
// =============================================================================

/// One representation level of a compression chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionTier {
    pub prototype: ItemKey,

    /// Base units represented by one unit at this tier.
    pub rate: u32,
}

impl CompressionTier {
    #[inline]
    pub const fn new(prototype: ItemKey, rate: u32) -> Self {
        CompressionTier { prototype, rate }
    }
}

/// `factor` units of `input` compress into one unit of `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionRecipe {
    pub input: ItemKey,
    pub output: ItemKey,
    pub factor: u32,
}

impl CompressionRecipe {
    pub const fn new(input: ItemKey, output: ItemKey, factor: u32) -> Self {
        CompressionRecipe {
            input,
            output,
            factor,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Capacity snapshot for tooltips and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellReport {
    pub variant: CellVariant,
    pub tier_label: String,
    pub status: CellStatus,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub stored_types: usize,
    pub max_types: usize,
    pub stored_count: u64,
    pub remaining_count: u64,
    pub stacks: Vec<KeyAmount>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_field_roundtrip_preserves_bits() {
        let key = ItemKey::new(u32::MAX - 3);
        assert!(key.to_field() < 0);
        assert_eq!(ItemKey::from_field(key.to_field()), key);
    }

    #[test]
    fn test_standard_kind_tiers() {
        let kind = CellKind::standard();
        assert_eq!(kind.tiers.len(), 5);
        assert_eq!(kind.tier(0).unwrap().display_bytes, 1_024);
        assert_eq!(kind.tier(4).unwrap().bytes_per_type, 2_048);
        assert!(matches!(
            kind.tier(5),
            Err(CoreError::UnknownTier {
                tier: 5,
                available: 5
            })
        ));
    }

    #[test]
    fn test_partition_first_is_seed() {
        let partition = PartitionConfig::from_keys([ItemKey::new(3), ItemKey::new(1)]);
        assert_eq!(partition.first(), Some(ItemKey::new(3)));
        assert!(partition.contains(ItemKey::new(1)));
        assert!(!PartitionConfig::new().contains(ItemKey::new(1)));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("direct".parse::<CellVariant>().unwrap(), CellVariant::Direct);
        assert_eq!(
            "Compacting".parse::<CellVariant>().unwrap(),
            CellVariant::Compacting
        );
        assert!("fluid".parse::<CellVariant>().is_err());
    }

    #[test]
    fn test_cell_kind_toml_defaults_max_types() {
        let kind: CellKind = serde_json::from_str(
            r#"{"name":"k","multiplier":2,"tiers":[{"label":"1k","display_bytes":1024,"bytes_per_type":8}]}"#,
        )
        .unwrap();
        assert_eq!(kind.max_types, MAX_TYPES);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = CellReport {
            variant: CellVariant::Direct,
            tier_label: "1k".to_string(),
            status: CellStatus::Empty,
            total_bytes: 1024,
            used_bytes: 0,
            free_bytes: 1024,
            stored_types: 0,
            max_types: 63,
            stored_count: 0,
            remaining_count: 8_128,
            stacks: Vec::new(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tierLabel\":\"1k\""));
        assert!(json.contains("\"status\":\"empty\""));
    }
}
