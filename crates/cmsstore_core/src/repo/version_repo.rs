//! SQLite storage for version snapshots.
//!
//! # Responsibility
//! - Append, read back and soft-delete snapshots in the configured table.
//!
//! # Invariants
//! - "Latest" is decided by `created_at` with insertion order (`rowid`)
//!   breaking ties inside the same second.
//! - Soft-deleted snapshots are invisible to reads.

use crate::model::entity::EntityKind;
use crate::model::lifecycle::now_datetime;
use crate::repo::entity_repo::{RepoError, RepoResult};
use crate::versioning::{VersionSnapshot, VersionStore};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Version store over one SQLite table.
pub struct SqliteVersionStore<'a> {
    conn: &'a Connection,
    table: &'a str,
}

impl<'a> SqliteVersionStore<'a> {
    /// `table` must come from a validated `StoreConfig`.
    pub fn new(conn: &'a Connection, table: &'a str) -> Self {
        Self { conn, table }
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id, entity_type, entity_id, content, created_at, soft_deleted_at
             FROM {}
             WHERE entity_type = ?1
               AND entity_id = ?2
               AND soft_deleted_at > ?3
             ORDER BY created_at DESC, rowid DESC",
            self.table
        )
    }
}

impl VersionStore for SqliteVersionStore<'_> {
    fn create_version(&self, snapshot: &VersionSnapshot) -> RepoResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, entity_type, entity_id, content, created_at, soft_deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                self.table
            ),
            params![
                snapshot.id,
                snapshot.entity_type.as_str(),
                snapshot.entity_id,
                snapshot.content,
                snapshot.created_at,
                snapshot.soft_deleted_at,
            ],
        )?;
        Ok(())
    }

    fn latest_version(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> RepoResult<Option<VersionSnapshot>> {
        let sql = format!("{} LIMIT 1;", self.select_sql());
        let row = self
            .conn
            .query_row(
                &sql,
                params![kind.as_str(), entity_id, now_datetime()],
                |row| Ok(parse_snapshot_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_versions(&self, kind: EntityKind, entity_id: &str) -> RepoResult<Vec<VersionSnapshot>> {
        let mut stmt = self.conn.prepare(&self.select_sql())?;
        let mut rows = stmt.query(params![kind.as_str(), entity_id, now_datetime()])?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next()? {
            snapshots.push(parse_snapshot_row(row)?);
        }
        Ok(snapshots)
    }

    fn soft_delete_versions(&self, kind: EntityKind, entity_id: &str) -> RepoResult<usize> {
        let now = now_datetime();
        let affected = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET soft_deleted_at = ?3
                 WHERE entity_type = ?1
                   AND entity_id = ?2
                   AND soft_deleted_at > ?3;",
                self.table
            ),
            params![kind.as_str(), entity_id, now],
        )?;
        Ok(affected)
    }
}

fn parse_snapshot_row(row: &Row<'_>) -> RepoResult<VersionSnapshot> {
    let type_text: String = row.get("entity_type")?;
    let entity_type = EntityKind::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid entity type `{type_text}` in version row"))
    })?;

    Ok(VersionSnapshot {
        id: row.get("id")?,
        entity_type,
        entity_id: row.get("entity_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        soft_deleted_at: row.get("soft_deleted_at")?,
    })
}
