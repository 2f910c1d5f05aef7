//! # Validation Module
//!
//! Checks engine configuration before any accountant uses it.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Config load (megacell-store::config)                         │
//! │  ├── TOML / env parsing                                                │
//! │  └── THIS MODULE: cell kind, channel and recipe rules                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Accountant construction                                      │
//! │  └── Tier index lookup (CoreError::UnknownTier)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Operations                                                   │
//! │  └── Never fail: bad inputs become rejections, bad fields become 0     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{CellKind, CompressionRecipe, PartitionConfig};
use crate::MAX_TYPES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cell Kind
// =============================================================================

/// Validates a cell kind and its tier table.
///
/// ## Rules
/// - `multiplier >= 1`
/// - `1 <= max_types <= 63`
/// - at least one tier, each with `display_bytes > 0` and
///   `bytes_per_type < display_bytes`
///
/// ## Example
/// ```rust
/// use megacell_core::types::CellKind;
/// use megacell_core::validation::validate_cell_kind;
///
/// assert!(validate_cell_kind(&CellKind::standard()).is_ok());
/// ```
pub fn validate_cell_kind(kind: &CellKind) -> ValidationResult<()> {
    if kind.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "cell.name".to_string(),
        });
    }

    if kind.multiplier == 0 {
        return Err(ValidationError::MustBePositive {
            field: "cell.multiplier".to_string(),
        });
    }

    if kind.max_types == 0 || kind.max_types > MAX_TYPES {
        return Err(ValidationError::OutOfRange {
            field: "cell.max_types".to_string(),
            min: 1,
            max: MAX_TYPES as u64,
        });
    }

    if kind.tiers.is_empty() {
        return Err(ValidationError::Required {
            field: "cell.tiers".to_string(),
        });
    }

    for tier in &kind.tiers {
        if tier.display_bytes == 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("cell.tiers[{}].display_bytes", tier.label),
            });
        }
        if tier.bytes_per_type >= tier.display_bytes {
            return Err(ValidationError::Inconsistent {
                field: format!("cell.tiers[{}].bytes_per_type", tier.label),
                reason: "must be smaller than display_bytes".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a channel's units per byte.
pub fn validate_units_per_byte(units_per_byte: u64) -> ValidationResult<()> {
    if units_per_byte == 0 {
        return Err(ValidationError::MustBePositive {
            field: "channel.units_per_byte".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Compression Recipes
// =============================================================================

/// Validates a single compression recipe.
pub fn validate_recipe(recipe: &CompressionRecipe) -> ValidationResult<()> {
    if recipe.factor < 2 {
        return Err(ValidationError::OutOfRange {
            field: "recipe.factor".to_string(),
            min: 2,
            max: u32::MAX as u64,
        });
    }

    if recipe.input == recipe.output {
        return Err(ValidationError::Inconsistent {
            field: "recipe.output".to_string(),
            reason: format!("{} compresses into itself", recipe.input),
        });
    }

    Ok(())
}

/// Validates a recipe table: each recipe, and no item compressed two ways.
pub fn validate_recipes(recipes: &[CompressionRecipe]) -> ValidationResult<()> {
    let mut inputs = HashSet::new();
    for recipe in recipes {
        validate_recipe(recipe)?;
        if !inputs.insert(recipe.input) {
            return Err(ValidationError::Duplicate {
                field: "recipe.input".to_string(),
                value: recipe.input.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Partition
// =============================================================================

/// Validates a partition: at most 63 entries, no duplicates.
pub fn validate_partition(partition: &PartitionConfig) -> ValidationResult<()> {
    if partition.len() > MAX_TYPES {
        return Err(ValidationError::OutOfRange {
            field: "partition".to_string(),
            min: 0,
            max: MAX_TYPES as u64,
        });
    }

    let mut seen = HashSet::new();
    for key in partition.keys() {
        if !seen.insert(*key) {
            return Err(ValidationError::Duplicate {
                field: "partition".to_string(),
                value: key.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellTier, ItemKey};

    #[test]
    fn test_validate_cell_kind() {
        let mut kind = CellKind::standard();
        assert!(validate_cell_kind(&kind).is_ok());

        kind.multiplier = 0;
        assert!(validate_cell_kind(&kind).is_err());

        kind = CellKind::standard();
        kind.max_types = 64;
        assert!(validate_cell_kind(&kind).is_err());

        kind = CellKind::standard();
        kind.tiers.clear();
        assert!(validate_cell_kind(&kind).is_err());

        kind = CellKind::standard();
        kind.tiers.push(CellTier::new("bad", 8, 8));
        assert!(matches!(
            validate_cell_kind(&kind),
            Err(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_validate_units_per_byte() {
        assert!(validate_units_per_byte(8).is_ok());
        assert!(validate_units_per_byte(0).is_err());
    }

    #[test]
    fn test_validate_recipes() {
        let a = ItemKey::new(1);
        let b = ItemKey::new(2);
        let c = ItemKey::new(3);

        assert!(validate_recipes(&[CompressionRecipe::new(a, b, 9)]).is_ok());
        assert!(validate_recipes(&[CompressionRecipe::new(a, b, 1)]).is_err());
        assert!(validate_recipes(&[CompressionRecipe::new(a, a, 9)]).is_err());
        assert!(matches!(
            validate_recipes(&[CompressionRecipe::new(a, b, 9), CompressionRecipe::new(a, c, 4)]),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_partition() {
        let ok = PartitionConfig::from_keys((0..63).map(ItemKey::new));
        assert!(validate_partition(&ok).is_ok());

        let too_long = PartitionConfig::from_keys((0..64).map(ItemKey::new));
        assert!(validate_partition(&too_long).is_err());

        let dup = PartitionConfig::from_keys([ItemKey::new(1), ItemKey::new(1)]);
        assert!(validate_partition(&dup).is_err());
    }
}
