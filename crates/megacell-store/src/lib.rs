//! # megacell-store: Cell Persistence for MegaCell
//!
//! This crate keeps cells in SQLite and hands their fields to the
//! accountants in `megacell-core` as an in-memory [`TagRecord`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MegaCell Data Flow                               │
//! │                                                                         │
//! │  Host (seed binary, game server, tooling)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   megacell-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │   (cell.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CellRepo      │    │ 001_cells    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │   ┌───────────────┐            │ Cell<TagRecord>                │   │
//! │  │   │ EngineConfig  │            ▼                                │   │
//! │  │   │ TOML + env    │    megacell-core accountants                │   │
//! │  │   └───────────────┘                                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Cell repository
//! - [`config`] - Engine configuration (TOML + environment)
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use megacell_store::{CellRepository, Database, EngineConfig, StoredCell};
//!
//! let config = EngineConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let mut stored = db.cells().load(&id).await?;
//! stored.open(&config.cell, host)?.inject(what, Actionable::Modulate);
//! db.cells().save(&mut stored).await?;
//! ```
//!
//! [`TagRecord`]: megacell_core::TagRecord

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use repository::cell::{CellRepository, StoredCell};
