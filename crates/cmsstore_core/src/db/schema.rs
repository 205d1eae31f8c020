//! DDL generation from the entity column catalogue.
//!
//! # Invariants
//! - `id` is the text primary key of every entity table.
//! - `sequence` columns are integers; every other column is non-null text
//!   defaulting to `''`, so hydrated rows never carry `NULL`.
//! - `soft_deleted_at` defaults to the "not deleted" sentinel.

use crate::model::entity::{EntityKind, COLUMN_ID, COLUMN_SOFT_DELETED_AT};
use crate::model::lifecycle::MAX_DATETIME;

/// Builds `CREATE TABLE` plus supporting indexes for one entity kind.
pub fn entity_table_sql(kind: EntityKind, table: &str) -> String {
    let columns = kind
        .columns()
        .iter()
        .map(|column| column_definition(column))
        .collect::<Vec<_>>()
        .join(",\n    ");

    let mut sql = format!("CREATE TABLE IF NOT EXISTS {table} (\n    {columns}\n);\n");
    sql.push_str(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_soft_deleted_at ON {table} (soft_deleted_at);\n"
    ));
    if kind.has_column("handle") {
        sql.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_handle ON {table} (handle);\n"
        ));
    }
    if kind.has_column("site_id") {
        sql.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_site_id ON {table} (site_id);\n"
        ));
    }
    sql
}

/// Builds the append-only version snapshot table.
pub fn version_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id TEXT PRIMARY KEY NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    soft_deleted_at TEXT NOT NULL DEFAULT '{MAX_DATETIME}'
);
CREATE INDEX IF NOT EXISTS idx_{table}_entity ON {table} (entity_type, entity_id, created_at);
"
    )
}

fn column_definition(column: &str) -> String {
    match column {
        COLUMN_ID => format!("{column} TEXT PRIMARY KEY NOT NULL"),
        "sequence" => format!("{column} INTEGER NOT NULL DEFAULT 0"),
        COLUMN_SOFT_DELETED_AT => format!("{column} TEXT NOT NULL DEFAULT '{MAX_DATETIME}'"),
        _ => format!("{column} TEXT NOT NULL DEFAULT ''"),
    }
}

#[cfg(test)]
mod tests {
    use super::{entity_table_sql, version_table_sql};
    use crate::model::entity::EntityKind;

    #[test]
    fn entity_ddl_declares_every_column() {
        let sql = entity_table_sql(EntityKind::MenuItem, "cms_menu_items");
        for column in EntityKind::MenuItem.columns() {
            assert!(sql.contains(&format!("    {column} ")), "missing {column}");
        }
        assert!(sql.contains("id TEXT PRIMARY KEY NOT NULL"));
        assert!(sql.contains("sequence INTEGER NOT NULL DEFAULT 0"));
        assert!(!sql.contains("idx_cms_menu_items_site_id"));
    }

    #[test]
    fn ddl_executes_on_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for kind in EntityKind::ALL {
            conn.execute_batch(&entity_table_sql(kind, kind.default_table()))
                .unwrap();
        }
        conn.execute_batch(&version_table_sql("cms_versions")).unwrap();
    }
}
