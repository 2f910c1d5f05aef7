//! # Recipe Decomposer
//!
//! Builds compression chains from a table of compression recipes.
//!
//! ## Chain Construction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Recipes:  9 nugget → 1 ingot      9 ingot → 1 block                    │
//! │                                                                         │
//! │  Seed = ingot                                                           │
//! │       │                                                                 │
//! │       ▼  walk DOWN (at most 2 steps)                                    │
//! │  ingot ← nugget            lowest form = nugget                         │
//! │       │                                                                 │
//! │       ▼  walk UP until 3 tiers                                          │
//! │  nugget (rate 1) → ingot (rate 9) → block (rate 81)                     │
//! │                                                                         │
//! │  Seed = block  → same chain, main tier = 2                              │
//! │  Seed = nugget → same chain, main tier = 0                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::host::Decomposer;
use crate::types::{CompressionRecipe, CompressionTier, ItemKey};
use crate::MAX_CHAIN_TIERS;

/// Decomposer backed by an in-memory recipe table.
#[derive(Debug, Clone, Default)]
pub struct RecipeDecomposer {
    /// input → (output, factor)
    up: HashMap<ItemKey, (ItemKey, u32)>,
    /// output → (input, factor)
    down: HashMap<ItemKey, (ItemKey, u32)>,
}

impl RecipeDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a decomposer; later recipes for the same input or output win.
    pub fn from_recipes<'r>(recipes: impl IntoIterator<Item = &'r CompressionRecipe>) -> Self {
        let mut decomposer = Self::new();
        for recipe in recipes {
            decomposer.add(*recipe);
        }
        decomposer
    }

    pub fn add(&mut self, recipe: CompressionRecipe) {
        if recipe.factor < 2 || recipe.input == recipe.output {
            return;
        }
        self.up.insert(recipe.input, (recipe.output, recipe.factor));
        self.down.insert(recipe.output, (recipe.input, recipe.factor));
    }

    pub fn len(&self) -> usize {
        self.up.len()
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }

    fn lowest_form(&self, seed: ItemKey) -> ItemKey {
        let mut current = seed;
        for _ in 1..MAX_CHAIN_TIERS {
            match self.down.get(&current) {
                Some(&(input, _)) if input != seed => current = input,
                _ => break,
            }
        }
        current
    }
}

impl Decomposer for RecipeDecomposer {
    fn decompose(&self, seed: ItemKey) -> Vec<CompressionTier> {
        let base = self.lowest_form(seed);
        let mut chain = vec![CompressionTier::new(base, 1)];

        while chain.len() < MAX_CHAIN_TIERS {
            let last = chain[chain.len() - 1];
            let Some(&(output, factor)) = self.up.get(&last.prototype) else {
                break;
            };
            if chain.iter().any(|t| t.prototype == output) {
                break;
            }
            let Some(rate) = last.rate.checked_mul(factor) else {
                break;
            };
            chain.push(CompressionTier::new(output, rate));
        }

        if !chain.iter().any(|t| t.prototype == seed) {
            // seed sits above a cycle; fall back to the seed alone
            return vec![CompressionTier::new(seed, 1)];
        }
        chain
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
