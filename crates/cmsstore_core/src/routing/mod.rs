//! Path routing helpers.
//!
//! # Responsibility
//! - Resolve inbound paths against templated page aliases.

pub mod alias;
