//! Application-defined SQL functions.
//!
//! # Invariants
//! - `cms_lower` folds with Rust's Unicode lowercase, the same folding the
//!   query compiler applies to bound patterns. SQLite's built-in `LOWER`
//!   only folds ASCII.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Name of the Unicode-aware lowercase scalar function.
pub const UNICODE_LOWER_FN: &str = "cms_lower";

/// Registers every store function on `conn`. Safe to call repeatedly.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}
