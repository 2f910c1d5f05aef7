//! # Persisted Record Codec
//!
//! The host stores cell state as named 32-bit integer fields. This module
//! defines that storage as a trait and encodes 64-bit counters into it.
//!
//! ## Hi/Lo Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  u64 counter "storedBaseUnits" = 0x0000_0002_8000_0001                  │
//! │                                                                         │
//! │     storedBaseUnitsHi : i32 = 0x0000_0002   (upper 32 bits)             │
//! │     storedBaseUnitsLo : i32 = 0x8000_0001   (lower 32 bits, as i32 =   │
//! │                                              -2147483647)              │
//! │                                                                         │
//! │  decode: ((hi as i64) << 32) | (lo as u32 as i64)                       │
//! │                                                                         │
//! │  The low half MUST go through u32 first: sign-extending a negative     │
//! │  lo would smear 1-bits over the entire high half.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This layout is the only bit-exact contract the engine owns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Record Trait
// =============================================================================

/// Host key-value storage limited to 32-bit integer fields.
pub trait PersistedRecord {
    /// Reads a field; `None` when absent.
    fn get_int(&self, key: &str) -> Option<i32>;

    /// Writes a field, replacing any previous value.
    fn put_int(&mut self, key: &str, value: i32);

    /// Removes a field if present.
    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get_int(key).is_some()
    }
}

// =============================================================================
// In-Memory Record
// =============================================================================

/// Reference record backed by an ordered map.
///
/// The store crate loads a cell's rows into a `TagRecord`, hands it to the
/// accountants, and writes the fields back afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRecord {
    fields: BTreeMap<String, i32>,
}

impl TagRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl PersistedRecord for TagRecord {
    fn get_int(&self, key: &str) -> Option<i32> {
        self.fields.get(key).copied()
    }

    fn put_int(&mut self, key: &str, value: i32) {
        self.fields.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.fields.remove(key);
    }
}

impl FromIterator<(String, i32)> for TagRecord {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        TagRecord {
            fields: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Codec
// =============================================================================

fn hi_key(key: &str) -> String {
    format!("{key}Hi")
}

fn lo_key(key: &str) -> String {
    format!("{key}Lo")
}

/// Splits a u64 into its (hi, lo) 32-bit field values.
#[inline]
pub const fn split_u64(value: u64) -> (i32, i32) {
    ((value >> 32) as u32 as i32, value as u32 as i32)
}

/// Recombines (hi, lo) field values into a u64.
#[inline]
pub const fn join_u64(hi: i32, lo: i32) -> u64 {
    (((hi as i64) << 32) | (lo as u32 as i64)) as u64
}

/// Reads a 64-bit counter; absent halves read as zero.
pub fn read_u64(record: &impl PersistedRecord, key: &str) -> u64 {
    let hi = record.get_int(&hi_key(key)).unwrap_or(0);
    let lo = record.get_int(&lo_key(key)).unwrap_or(0);
    join_u64(hi, lo)
}

/// Writes a 64-bit counter as two fields.
pub fn write_u64(record: &mut impl PersistedRecord, key: &str, value: u64) {
    let (hi, lo) = split_u64(value);
    record.put_int(&hi_key(key), hi);
    record.put_int(&lo_key(key), lo);
}

/// Removes both halves of a 64-bit counter.
pub fn remove_u64(record: &mut impl PersistedRecord, key: &str) {
    record.remove(&hi_key(key));
    record.remove(&lo_key(key));
}

/// Reads a 32-bit field; absent reads as zero.
pub fn read_i32(record: &impl PersistedRecord, key: &str) -> i32 {
    record.get_int(key).unwrap_or(0)
}

/// Reads a count field, treating absent or negative values as zero.
pub fn read_len(record: &impl PersistedRecord, key: &str) -> usize {
    usize::try_from(read_i32(record, key)).unwrap_or(0)
}

/// Writes a count field (clamped into the i32 range).
pub fn write_len(record: &mut impl PersistedRecord, key: &str, len: usize) {
    record.put_int(key, i32::try_from(len).unwrap_or(i32::MAX));
}

// =============================================================================
// Field Names
// =============================================================================

/// Field names shared by both accountants.
pub mod keys {
    // Direct
    pub const TYPES: &str = "types";
    pub const STORED_COUNT: &str = "storedCount";

    pub fn type_key(index: usize) -> String {
        format!("type{index}Key")
    }

    pub fn type_count(index: usize) -> String {
        format!("type{index}Count")
    }

    // Compacting
    pub const STORED_BASE_UNITS: &str = "storedBaseUnits";
    pub const CHAIN_TIERS: &str = "chainTiers";
    pub const MAIN_TIER: &str = "mainTier";
    pub const CACHED_PARTITION: &str = "cachedPartition";

    pub fn tier_key(index: usize) -> String {
        format!("tier{index}Key")
    }

    pub fn tier_rate(index: usize) -> String {
        format!("tier{index}Rate")
    }

    pub fn cached_partition_entry(index: usize) -> String {
        format!("cachedPartition{index}")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_join_edges() {
        for value in [0, 1, u32::MAX as u64, 1 << 32, 0x0000_0002_8000_0001, u64::MAX] {
            let (hi, lo) = split_u64(value);
            assert_eq!(join_u64(hi, lo), value, "value {value:#x}");
        }
    }

    #[test]
    fn test_negative_lo_does_not_sign_extend() {
        // lo = -1 means 0xFFFF_FFFF, not all-ones across 64 bits
        assert_eq!(join_u64(0, -1), 0xFFFF_FFFF);
        assert_eq!(join_u64(1, -1), 0x1_FFFF_FFFF);
    }

    #[test]
    fn test_layout_field_names() {
        let mut record = TagRecord::new();
        write_u64(&mut record, "storedBaseUnits", 0x0000_0002_8000_0001);

        assert_eq!(record.get_int("storedBaseUnitsHi"), Some(2));
        assert_eq!(record.get_int("storedBaseUnitsLo"), Some(0x8000_0001_u32 as i32));
        assert_eq!(read_u64(&record, "storedBaseUnits"), 0x0000_0002_8000_0001);
    }

    #[test]
    fn test_absent_fields_read_zero() {
        let mut record = TagRecord::new();
        assert_eq!(read_u64(&record, "missing"), 0);
        assert_eq!(read_len(&record, "missing"), 0);

        record.put_int("negative", -4);
        assert_eq!(read_len(&record, "negative"), 0);

        // Only one half present
        record.put_int("halfLo", 7);
        assert_eq!(read_u64(&record, "half"), 7);
    }

    #[test]
    fn test_remove_u64() {
        let mut record = TagRecord::new();
        write_u64(&mut record, "x", 5);
        remove_u64(&mut record, "x");
        assert!(record.is_empty());
    }

    #[test]
    fn test_tag_record_serde_is_flat_map() {
        let mut record = TagRecord::new();
        record.put_int("types", 2);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"types":2}"#);
    }
}
