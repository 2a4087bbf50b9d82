//! Persistence of ingested boundary data for the boundary engine.
//!
//! Responsibilities:
//! - Write state and county boundaries into the SQLite layout read by
//!   `boundary_core::SqliteBoundaryStore`.
//! - Derive the envelope columns that back the store's spatial index.
//!
//! Boundaries:
//! - Do not parse source feeds; callers hand over validated entities.
//! - Do not encode query rules (live in `boundary-core`).
//!
//! Invariants:
//! - A county is only written when its state exists.
//! - Each call commits everything or nothing.
#![forbid(unsafe_code)]

mod persist;

pub use persist::{PersistEntitiesError, PersistSummary, persist_entities_to_sqlite};
