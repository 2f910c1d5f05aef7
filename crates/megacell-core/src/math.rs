//! # Saturating Arithmetic
//!
//! Overflow-safe primitives for capacity-scale numbers.
//!
//! ## Why Saturate?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE WRAPPING PROBLEM                                                   │
//! │                                                                         │
//! │  A 256k cell with a 2^40 multiplier and a compression rate of 81:      │
//! │    262_144 × 8 × 2^40 × 81  ≈ 1.9 × 10^20   > u64::MAX                 │
//! │                                                                         │
//! │  Wrapping arithmetic would turn that into a SMALL number and the       │
//! │  cell would suddenly report itself as nearly full.                     │
//! │                                                                         │
//! │  OUR SOLUTION: clamp at u64::MAX (the SATURATED sentinel)              │
//! │    "more than we can count" stays "more than we can count"             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every multiplication or addition of two capacity-scale values in this crate
//! goes through [`mul_sat`] or [`add_sat`]. Subtraction clamps at zero via
//! [`sub_floor`].

// =============================================================================
// Constants
// =============================================================================

/// The value every saturating operation clamps to.
pub const SATURATED: u64 = u64::MAX;

// =============================================================================
// Core Primitives
// =============================================================================

/// Multiplies two counts, clamping at [`SATURATED`].
///
/// ## Example
/// ```rust
/// use megacell_core::math::{mul_sat, SATURATED};
///
/// assert_eq!(mul_sat(1024, 8), 8192);
/// assert_eq!(mul_sat(u64::MAX / 2, 3), SATURATED);
/// ```
#[inline]
pub const fn mul_sat(a: u64, b: u64) -> u64 {
    a.saturating_mul(b)
}

/// Adds two counts, clamping at [`SATURATED`].
#[inline]
pub const fn add_sat(a: u64, b: u64) -> u64 {
    a.saturating_add(b)
}

/// Multiplies two host-side signed amounts.
///
/// Quantities in this domain are never negative, so a negative operand
/// contributes nothing and yields 0.
///
/// ## Example
/// ```rust
/// use megacell_core::math::mul_sat_signed;
///
/// assert_eq!(mul_sat_signed(9, 9), 81);
/// assert_eq!(mul_sat_signed(-1, 9), 0);
/// assert_eq!(mul_sat_signed(i64::MAX, i64::MAX), u64::MAX);
/// ```
#[inline]
pub const fn mul_sat_signed(a: i64, b: i64) -> u64 {
    if a < 0 || b < 0 {
        return 0;
    }
    mul_sat(a as u64, b as u64)
}

/// Subtracts `b` from `a`, clamping at zero.
#[inline]
pub const fn sub_floor(a: u64, b: u64) -> u64 {
    a.saturating_sub(b)
}

/// Ceiling division. A zero divisor is treated as 1.
///
/// Used for "bytes used": a partially filled display byte still counts.
#[inline]
pub const fn ceil_div(n: u64, d: u64) -> u64 {
    let d = if d == 0 { 1 } else { d };
    // (n + d - 1) / d overflows near u64::MAX, so split it instead
    n / d + (n % d != 0) as u64
}

// =============================================================================
// Host Amount Conversions
// =============================================================================

/// Converts an internal count to a host amount (`i64`), clamping at `i64::MAX`.
#[inline]
pub fn to_amount(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Converts a host amount to an internal count; negatives become 0.
#[inline]
pub fn from_amount(amount: i64) -> u64 {
    u64::try_from(amount).unwrap_or(0)
}

/// Signed difference `after - before`, clamped to the `i64` range.
///
/// ## Example
/// ```rust
/// use megacell_core::math::signed_delta;
///
/// assert_eq!(signed_delta(0, 1), 1);
/// assert_eq!(signed_delta(9, 0), -9);
/// assert_eq!(signed_delta(0, u64::MAX), i64::MAX);
/// ```
pub fn signed_delta(before: u64, after: u64) -> i64 {
    if after >= before {
        to_amount(after - before)
    } else {
        i64::try_from(before - after).map(|d| -d).unwrap_or(i64::MIN)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
