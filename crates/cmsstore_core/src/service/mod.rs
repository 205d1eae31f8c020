//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate entity store calls into request-level lookups.
//! - Keep callers decoupled from query construction details.

pub mod route_service;
