//! # Error Types
//!
//! Domain-specific error types for megacell-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  megacell-core errors (this file)                                      │
//! │  ├── CoreError        - Cell construction / lookup failures            │
//! │  └── ValidationError  - Configuration validation failures              │
//! │                                                                         │
//! │  megacell-store errors (separate crate)                                │
//! │  └── StoreError       - Database, config file and I/O failures         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Rejected or partial inject/extract operations are ordinary results
//! (a remainder, or `None`), never an `Err`. Overflow saturates. Malformed
//! persisted fields read as zero. Errors only exist for things a caller must
//! fix: an unknown tier index or an invalid cell kind.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while binding an accountant to a cell.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cell's tier index does not exist in its kind's tier table.
    ///
    /// ## When This Occurs
    /// - A record created for a 256k cell is opened with a kind that only
    ///   defines 1k..64k
    /// - A corrupted tier column in the store
    #[error("Unknown cell tier {tier} (kind defines {available} tiers)")]
    UnknownTier { tier: usize, available: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: u64, max: u64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not consistent with another field.
    #[error("{field} is invalid: {reason}")]
    Inconsistent { field: String, reason: String },

    /// Duplicate value (e.g., the same item twice in a partition).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
