//! # Capacity Model
//!
//! Converts between the small display scale and the multiplied actual scale.
//!
//! ## Two Scales
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   DISPLAY SCALE                      ACTUAL SCALE                       │
//! │   ─────────────                      ────────────                       │
//! │   "1k" = 1024 bytes      × units/byte × multiplier  →  units            │
//! │   8 bytes per type                                                      │
//! │                                                                         │
//! │   ORDER MATTERS:                                                        │
//! │     (1024 - 8) × 8 × 2^40        ✅  overhead removed first             │
//! │     1024 × 8 × 2^40 - 8 × …      ❌  may saturate before subtracting    │
//! │                                                                         │
//! │   Type overhead is always taken off the DISPLAY bytes, then the         │
//! │   multiplications run through mul_sat.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::math::{ceil_div, mul_sat, sub_floor};
use crate::types::{CellStatus, CellTier};

// =============================================================================
// Free Functions
// =============================================================================

/// Actual byte capacity: `display_bytes × multiplier`, saturating.
#[inline]
pub const fn actual_capacity(display_bytes: u64, multiplier: u64) -> u64 {
    mul_sat(display_bytes, multiplier)
}

/// Actual capacity in content units.
///
/// Multiplies by `units_per_byte` before the multiplier; callers subtract
/// any type overhead from `display_bytes` beforehand.
///
/// ## Example
/// ```rust
/// use megacell_core::capacity::actual_capacity_in_units;
///
/// // 1k cell, 8 items per byte, no multiplier
/// assert_eq!(actual_capacity_in_units(1024, 8, 1), 8192);
/// ```
#[inline]
pub const fn actual_capacity_in_units(display_bytes: u64, units_per_byte: u64, multiplier: u64) -> u64 {
    mul_sat(mul_sat(display_bytes, units_per_byte), multiplier)
}

/// Units that fit in one display byte; never 0.
#[inline]
pub const fn items_per_display_byte(units_per_byte: u64, multiplier: u64) -> u64 {
    let per_byte = mul_sat(units_per_byte, multiplier);
    if per_byte == 0 {
        1
    } else {
        per_byte
    }
}

/// Display bytes occupied by `stored_units` (partial bytes round up).
#[inline]
pub const fn used_bytes(stored_units: u64, units_per_byte: u64, multiplier: u64) -> u64 {
    ceil_div(stored_units, items_per_display_byte(units_per_byte, multiplier))
}

/// Direct-cell status, evaluated in precedence order.
pub fn direct_status(
    stored_units: u64,
    stored_types: usize,
    max_types: usize,
    remaining_units: u64,
) -> CellStatus {
    if stored_units == 0 && stored_types == 0 {
        CellStatus::Empty
    } else if stored_types < max_types && remaining_units > 0 {
        CellStatus::HasRoomForNewType
    } else if remaining_units > 0 {
        CellStatus::HasRoomForMore
    } else {
        CellStatus::Full
    }
}

// =============================================================================
// Capacity Model
// =============================================================================

/// The four numbers every capacity question needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityModel {
    pub display_bytes: u64,
    pub bytes_per_type: u64,
    pub units_per_byte: u64,
    pub multiplier: u64,
}

impl CapacityModel {
    pub fn new(tier: &CellTier, units_per_byte: u64, multiplier: u64) -> Self {
        CapacityModel {
            display_bytes: tier.display_bytes,
            bytes_per_type: tier.bytes_per_type,
            units_per_byte,
            multiplier,
        }
    }

    /// Displayed total bytes.
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.display_bytes
    }

    /// Total bytes on the actual scale.
    #[inline]
    pub fn actual_total_bytes(&self) -> u64 {
        actual_capacity(self.display_bytes, self.multiplier)
    }

    #[inline]
    pub fn items_per_display_byte(&self) -> u64 {
        items_per_display_byte(self.units_per_byte, self.multiplier)
    }

    /// Display bytes reserved as overhead for `charged_types` types.
    #[inline]
    pub fn overhead_bytes(&self, charged_types: u64) -> u64 {
        mul_sat(self.bytes_per_type, charged_types)
    }

    /// Unit capacity after reserving overhead for `charged_types` types.
    pub fn capacity_in_units(&self, charged_types: u64) -> u64 {
        let usable = sub_floor(self.display_bytes, self.overhead_bytes(charged_types));
        actual_capacity_in_units(usable, self.units_per_byte, self.multiplier)
    }

    /// Display bytes occupied by `stored_units` content units.
    #[inline]
    pub fn used_bytes(&self, stored_units: u64) -> u64 {
        used_bytes(stored_units, self.units_per_byte, self.multiplier)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SATURATED;

    fn model(multiplier: u64) -> CapacityModel {
        CapacityModel::new(&CellTier::new("1k", 1024, 8), 8, multiplier)
    }

    #[test]
    fn test_actual_capacity() {
        assert_eq!(actual_capacity(1024, 1 << 40), 1 << 50);
        assert_eq!(actual_capacity(1 << 40, 1 << 40), SATURATED);
    }

    #[test]
    fn test_overhead_subtracted_before_multiplier() {
        // Multiplying first would saturate and make the overhead vanish.
        let m = CapacityModel::new(&CellTier::new("256k", 262_144, 2_048), 8, u64::MAX / 1024);
        assert_eq!(m.capacity_in_units(0), SATURATED);
        assert_eq!(m.capacity_in_units(1), SATURATED);

        let small = model(1);
        assert_eq!(small.capacity_in_units(0), 8192);
        assert_eq!(small.capacity_in_units(1), (1024 - 8) * 8);
        assert_eq!(small.capacity_in_units(200), 0);
    }

    #[test]
    fn test_used_bytes_rounds_up() {
        let m = model(1);
        assert_eq!(m.used_bytes(0), 0);
        assert_eq!(m.used_bytes(1), 1);
        assert_eq!(m.used_bytes(8), 1);
        assert_eq!(m.used_bytes(9), 2);
    }

    #[test]
    fn test_items_per_display_byte_floor() {
        assert_eq!(items_per_display_byte(0, 1 << 40), 1);
        assert_eq!(items_per_display_byte(8, 1), 8);
        assert_eq!(items_per_display_byte(8, SATURATED), SATURATED);
    }

    #[test]
    fn test_direct_status_precedence() {
        assert_eq!(direct_status(0, 0, 63, 100), CellStatus::Empty);
        assert_eq!(direct_status(5, 1, 63, 100), CellStatus::HasRoomForNewType);
        assert_eq!(direct_status(5, 63, 63, 100), CellStatus::HasRoomForMore);
        assert_eq!(direct_status(5, 1, 63, 0), CellStatus::Full);
    }
}
