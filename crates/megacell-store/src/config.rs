//! # Engine Configuration
//!
//! Cell kind, channel, recipes and database settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEGACELL_DB_PATH=/srv/megacell.db                                  │
//! │     MEGACELL_MULTIPLIER=1099511627776                                  │
//! │     MEGACELL_UNITS_PER_BYTE=8                                          │
//! │     MEGACELL_MAX_TYPES=63                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/megacell/megacell.toml (Linux)                           │
//! │     ~/Library/Application Support/dev.megacell.megacell/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     standard 1k..256k tiers, 2^40 multiplier, 8 units per byte         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "megacell.db"
//! max_connections = 5
//!
//! [cell]
//! name = "mega_item"
//! multiplier = 1099511627776
//! max_types = 63
//!
//! [[cell.tiers]]
//! label = "1k"
//! display_bytes = 1024
//! bytes_per_type = 8
//!
//! [channel]
//! units_per_byte = 8
//!
//! [[recipes]]
//! input = 10
//! output = 11
//! factor = 9
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use megacell_core::validation::{validate_cell_kind, validate_recipes, validate_units_per_byte};
use megacell_core::{CellKind, CompressionRecipe, ItemChannel, RecipeDecomposer};

use crate::error::{StoreError, StoreResult};
use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "MEGACELL_DB_PATH";
pub const ENV_MULTIPLIER: &str = "MEGACELL_MULTIPLIER";
pub const ENV_UNITS_PER_BYTE: &str = "MEGACELL_UNITS_PER_BYTE";
pub const ENV_MAX_TYPES: &str = "MEGACELL_MAX_TYPES";

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("megacell.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[channel]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    #[serde(default = "default_units_per_byte")]
    pub units_per_byte: u64,
}

fn default_units_per_byte() -> u64 {
    ItemChannel::DEFAULT_UNITS_PER_BYTE
}

impl Default for ChannelSettings {
    fn default() -> Self {
        ChannelSettings {
            units_per_byte: default_units_per_byte(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cell: CellKind,

    #[serde(default)]
    pub channel: ChannelSettings,

    #[serde(default)]
    pub recipes: Vec<CompressionRecipe>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (megacell.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        validate_cell_kind(&self.cell)?;
        validate_units_per_byte(self.channel.units_per_byte)?;
        validate_recipes(&self.recipes)?;

        if self.database.max_connections == 0 {
            return Err(StoreError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup` (the process environment in
    /// [`load`](Self::load)). Unparseable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_MULTIPLIER) {
            match raw.parse::<u64>() {
                Ok(multiplier) => {
                    debug!(multiplier, "Overriding multiplier from environment");
                    self.cell.multiplier = multiplier;
                }
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_MULTIPLIER),
            }
        }

        if let Some(raw) = lookup(ENV_UNITS_PER_BYTE) {
            match raw.parse::<u64>() {
                Ok(units) => self.channel.units_per_byte = units,
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_UNITS_PER_BYTE),
            }
        }

        if let Some(raw) = lookup(ENV_MAX_TYPES) {
            match raw.parse::<usize>() {
                Ok(max) => self.cell.max_types = max,
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_MAX_TYPES),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "megacell", "megacell")
            .map(|dirs| dirs.config_dir().join("megacell.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn channel(&self) -> ItemChannel {
        ItemChannel::new(self.channel.units_per_byte)
    }

    pub fn decomposer(&self) -> RecipeDecomposer {
        RecipeDecomposer::from_recipes(&self.recipes)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
