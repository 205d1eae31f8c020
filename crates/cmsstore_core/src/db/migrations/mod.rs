//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically, using configured table names.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::config::StoreConfig;
use crate::db::schema::{entity_table_sql, version_table_sql};
use crate::db::{DbError, DbResult};
use crate::model::entity::EntityKind;
use log::info;
use rusqlite::{Connection, Transaction};

type MigrationStep = fn(&Transaction<'_>, &StoreConfig) -> rusqlite::Result<()>;

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    apply: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "entity_tables",
        apply: create_entity_tables,
    },
    Migration {
        version: 2,
        name: "version_table",
        apply: create_version_table,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection, config: &StoreConfig) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        (migration.apply)(&tx, config)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

fn create_entity_tables(tx: &Transaction<'_>, config: &StoreConfig) -> rusqlite::Result<()> {
    for kind in EntityKind::ALL {
        tx.execute_batch(&entity_table_sql(kind, config.table_name(kind)))?;
    }
    Ok(())
}

fn create_version_table(tx: &Transaction<'_>, config: &StoreConfig) -> rusqlite::Result<()> {
    tx.execute_batch(&version_table_sql(config.version_table()))
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
