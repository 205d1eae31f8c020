//! Repository layer: generic entity persistence over SQLite.
//!
//! # Responsibility
//! - Define the entity store contract used by services and callers.
//! - Isolate SQL execution details from services.
//!
//! # Invariants
//! - Not-found on lookups is `Ok(None)`, never an error.
//! - Backend errors are surfaced unchanged; nothing is retried.

pub mod entity_repo;
pub mod version_repo;
