//! Soft-delete lifecycle and datetime text helpers.
//!
//! # Responsibility
//! - Define the "not deleted" sentinel stored in `soft_deleted_at`.
//! - Format and compare the datetime text persisted in every audit column.
//!
//! # Invariants
//! - Soft-delete state is always computed against a caller-visible "now",
//!   never cached as a boolean.
//! - Datetime text sorts lexicographically in time order, so SQL range
//!   predicates can compare the stored strings directly.

use chrono::{NaiveDateTime, Utc};

/// Text format of every persisted datetime column (UTC).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel meaning "not deleted".
pub const MAX_DATETIME: &str = "9999-12-31 23:59:59";

/// Returns the current UTC time in persisted text form.
pub fn now_datetime() -> String {
    format_datetime(Utc::now().naive_utc())
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Parses persisted datetime text. Returns `None` for empty or malformed input.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).ok()
}

/// Returns whether a stored `soft_deleted_at` value means "deleted" at `now`.
///
/// Unparseable or absent values count as live, so rows loaded with a column
/// subset never look deleted by accident.
pub fn is_soft_deleted_at(stored: &str, now: NaiveDateTime) -> bool {
    match parse_datetime(stored) {
        Some(deleted_at) => deleted_at <= now,
        None => false,
    }
}
