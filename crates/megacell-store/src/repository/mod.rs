//! # Repository Module
//!
//! Database repositories for the cell store.
//!
//! ## Load / Operate / Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.cells().load(id)          cells row + cell_fields rows             │
//! │       │                       → StoredCell { Cell<TagRecord> }          │
//! │       ▼                                                                 │
//! │  stored.open(&kind, host)     accountant over the in-memory record     │
//! │       │                                                                 │
//! │       ▼  inject / extract (MODULATE flushes into the TagRecord)        │
//! │                                                                         │
//! │  db.cells().save(&stored)     one transaction: row update +            │
//! │                               field rows replaced                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CellRepository`](cell::CellRepository) - Cell CRUD

pub mod cell;
