//! List query specification and its SQL compiler.
//!
//! # Responsibility
//! - Validate caller filter/sort/paging intent per entity kind.
//! - Compile validated queries into parameterized SQLite statements.
//!
//! # Invariants
//! - Validation errors are raised before any backend call.

pub mod compile;
pub mod list_query;
