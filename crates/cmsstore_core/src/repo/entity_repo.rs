//! Entity store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/soft-delete/list/count/find APIs for every
//!   entity kind through one generic engine.
//! - Turn change-tracked records into partial `UPDATE` statements.
//! - Feed the versioning tracker after successful writes.
//!
//! # Invariants
//! - Query validation runs before any statement is prepared.
//! - `update` on a clean entity issues no statement at all.
//! - Only catalogue columns are ever written; the `id` column is never
//!   rewritten by `update`.
//! - Version snapshot failures are logged and never fail the mutation.
//! - One statement per operation; concurrent updates of the same row from
//!   different entity instances are last-write-wins.

use crate::config::{ConfigError, StoreConfig};
use crate::db::functions::register_functions;
use crate::db::DbError;
use crate::model::entity::{Entity, EntityKind, FieldCodecError, COLUMN_ID};
use crate::model::lifecycle::now_datetime;
use crate::model::record::Record;
use crate::query::compile::compile;
use crate::query::list_query::{ListQuery, QueryValidationError};
use crate::repo::version_repo::SqliteVersionStore;
use crate::versioning::record_snapshot;
use log::{debug, error, info, warn};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, ErrorCode, InterruptHandle, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Query specification has a set-but-degenerate field.
    Query(QueryValidationError),
    /// Backend failure, surfaced verbatim.
    Db(DbError),
    /// Target row of an update does not exist.
    NotFound { kind: EntityKind, id: String },
    /// Write was attempted on an entity with an empty id.
    MissingId(EntityKind),
    /// Record carries a field the entity kind has no column for.
    UnknownField { kind: EntityKind, field: String },
    /// Configured table is absent from the connected database.
    MissingRequiredTable(String),
    /// Statement was cancelled through an interrupt handle.
    Interrupted,
    /// Persisted data cannot be mapped back to a model value.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::MissingId(kind) => write!(f, "{kind} id cannot be empty"),
            Self::UnknownField { kind, field } => {
                write!(f, "{kind} has no column named `{field}`")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "entity store requires table `{table}`")
            }
            Self::Interrupted => write!(f, "statement interrupted"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryValidationError> for RepoError {
    fn from(value: QueryValidationError) -> Self {
        Self::Query(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Db(DbError::InvalidConfig(value))
    }
}

impl From<FieldCodecError> for RepoError {
    fn from(value: FieldCodecError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &value {
            if failure.code == ErrorCode::OperationInterrupted {
                return Self::Interrupted;
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Generic persistence contract shared by every entity kind.
pub trait EntityStore {
    /// Inserts the full field map and stamps `created_at`/`updated_at`.
    fn create<E: Entity>(&self, entity: &mut E) -> RepoResult<()>;
    /// Writes only the dirty fields; a clean entity is a no-op.
    fn update<E: Entity>(&self, entity: &mut E) -> RepoResult<()>;
    /// Hard-deletes a row by id. Missing rows are not an error.
    fn delete_by_id<E: Entity>(&self, id: &str) -> RepoResult<()>;
    fn list<E: Entity>(&self, query: &ListQuery) -> RepoResult<Vec<E>>;
    fn count<E: Entity>(&self, query: &ListQuery) -> RepoResult<i64>;

    /// Stamps `soft_deleted_at` and persists it through [`EntityStore::update`].
    fn soft_delete<E: Entity>(&self, entity: &mut E) -> RepoResult<()> {
        entity.set_soft_deleted_at(now_datetime());
        self.update(entity)
    }

    /// Loads a live entity by id and soft-deletes it.
    fn soft_delete_by_id<E: Entity>(&self, id: &str) -> RepoResult<()> {
        match self.find_by_id::<E>(id)? {
            Some(mut entity) => self.soft_delete(&mut entity),
            None => Err(RepoError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            }),
        }
    }

    fn delete<E: Entity>(&self, entity: &E) -> RepoResult<()> {
        self.delete_by_id::<E>(entity.id())
    }

    /// Returns `Ok(None)` when no live row has this id.
    fn find_by_id<E: Entity>(&self, id: &str) -> RepoResult<Option<E>> {
        let query = ListQuery::new().with_id(id).with_limit(1);
        Ok(self.list::<E>(&query)?.into_iter().next())
    }

    /// Returns `Ok(None)` when no live row has this handle.
    fn find_by_handle<E: Entity>(&self, handle: &str) -> RepoResult<Option<E>> {
        let query = ListQuery::new().with_handle(handle).with_limit(1);
        Ok(self.list::<E>(&query)?.into_iter().next())
    }
}

/// SQLite-backed entity store.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
    config: StoreConfig,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Creates a store over a migrated connection.
    ///
    /// # Errors
    /// - Invalid `config` table names.
    /// - `MissingRequiredTable` when a configured table does not exist.
    pub fn try_new(conn: &'conn Connection, config: StoreConfig) -> RepoResult<Self> {
        config.validate()?;
        register_functions(conn)?;
        for kind in EntityKind::ALL {
            ensure_table_exists(conn, config.table_name(kind))?;
        }
        if config.versioning_enabled() {
            ensure_table_exists(conn, config.version_table())?;
        }
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Handle another thread can use to cancel the in-flight statement.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Read access to the version snapshot table.
    pub fn versions(&self) -> SqliteVersionStore<'_> {
        SqliteVersionStore::new(self.conn, self.config.version_table())
    }

    /// Counts rows of `kind` without needing a concrete entity type.
    pub fn count_kind(&self, kind: EntityKind, query: &ListQuery) -> RepoResult<i64> {
        let query = query.clone().with_count_only(true);
        query.validate(kind)?;

        let compiled = compile(kind, self.table(kind), &query, &now_datetime());
        let total = self.conn.query_row(
            &compiled.sql,
            params_from_iter(compiled.params.iter()),
            |row| row.get::<_, i64>(0),
        )?;
        Ok(total)
    }

    fn table(&self, kind: EntityKind) -> &str {
        self.config.table_name(kind)
    }

    fn snapshot_version<E: Entity>(&self, entity: &E) {
        if !self.config.versioning_enabled() {
            return;
        }

        let complete = E::KIND.columns().iter().all(|column| entity.record().contains(column));
        let reloaded;
        let source = if complete {
            entity
        } else {
            match self.reload_for_snapshot::<E>(entity.id()) {
                Some(full) => {
                    reloaded = full;
                    &reloaded
                }
                None => return,
            }
        };

        let content = match source.to_versioned_content() {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    "event=version_snapshot module=repo status=error kind={} id={} error={}",
                    E::KIND,
                    entity.id(),
                    err
                );
                return;
            }
        };

        match record_snapshot(&self.versions(), E::KIND, entity.id(), &content) {
            Ok(true) => debug!(
                "event=version_snapshot module=repo status=ok kind={} id={}",
                E::KIND,
                entity.id()
            ),
            Ok(false) => debug!(
                "event=version_snapshot module=repo status=skip reason=unchanged kind={} id={}",
                E::KIND,
                entity.id()
            ),
            Err(err) => warn!(
                "event=version_snapshot module=repo status=error kind={} id={} error={}",
                E::KIND,
                entity.id(),
                err
            ),
        }
    }

    /// Reads the full stored row of a partially selected entity, soft-deleted
    /// rows included.
    fn reload_for_snapshot<E: Entity>(&self, id: &str) -> Option<E> {
        let query = ListQuery::new()
            .with_id(id)
            .with_soft_deleted(true)
            .with_limit(1);
        match self.list::<E>(&query).map(|rows| rows.into_iter().next()) {
            Ok(Some(full)) => Some(full),
            Ok(None) => {
                warn!(
                    "event=version_snapshot module=repo status=skip reason=row_missing \
                     kind={} id={}",
                    E::KIND,
                    id
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=version_snapshot module=repo status=error kind={} id={} error={}",
                    E::KIND,
                    id,
                    err
                );
                None
            }
        }
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn create<E: Entity>(&self, entity: &mut E) -> RepoResult<()> {
        if entity.id().is_empty() {
            return Err(RepoError::MissingId(E::KIND));
        }

        let started_at = Instant::now();
        let now = now_datetime();
        entity.set_created_at(now.clone());
        entity.set_updated_at(now);

        let data = entity.record().data();
        ensure_known_columns(E::KIND, data.keys())?;
        let columns = data.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; data.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders});",
            self.table(E::KIND)
        );

        if let Err(err) = self.conn.execute(&sql, params_from_iter(data.values())) {
            error!(
                "event=entity_create module=repo status=error kind={} duration_ms={} error={}",
                E::KIND,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=entity_create module=repo status=ok kind={} id={} duration_ms={}",
            E::KIND,
            entity.id(),
            started_at.elapsed().as_millis()
        );
        entity.record_mut().mark_as_not_dirty();
        self.snapshot_version(entity);
        Ok(())
    }

    fn update<E: Entity>(&self, entity: &mut E) -> RepoResult<()> {
        if entity.id().is_empty() {
            return Err(RepoError::MissingId(E::KIND));
        }

        if changed_without_id(entity.record()).is_empty() {
            debug!(
                "event=entity_update module=repo status=skip reason=clean kind={} id={}",
                E::KIND,
                entity.id()
            );
            return Ok(());
        }

        let started_at = Instant::now();
        entity.set_updated_at(now_datetime());
        let changed = changed_without_id(entity.record());
        ensure_known_columns(E::KIND, changed.keys())?;

        let assignments = changed
            .keys()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {COLUMN_ID} = ?;",
            self.table(E::KIND)
        );
        let bind_values = changed
            .values()
            .map(String::as_str)
            .chain(std::iter::once(entity.id()));

        let affected = match self.conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(affected) => affected,
            Err(err) => {
                error!(
                    "event=entity_update module=repo status=error kind={} id={} \
                     duration_ms={} error={}",
                    E::KIND,
                    entity.id(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        if affected == 0 {
            return Err(RepoError::NotFound {
                kind: E::KIND,
                id: entity.id().to_string(),
            });
        }

        info!(
            "event=entity_update module=repo status=ok kind={} id={} columns={} duration_ms={}",
            E::KIND,
            entity.id(),
            changed.len(),
            started_at.elapsed().as_millis()
        );
        entity.record_mut().mark_as_not_dirty();
        self.snapshot_version(entity);
        Ok(())
    }

    fn delete_by_id<E: Entity>(&self, id: &str) -> RepoResult<()> {
        if id.is_empty() {
            return Err(RepoError::MissingId(E::KIND));
        }

        let sql = format!("DELETE FROM {} WHERE {COLUMN_ID} = ?1;", self.table(E::KIND));
        let affected = self.conn.execute(&sql, [id])?;
        info!(
            "event=entity_delete module=repo status=ok kind={} id={} rows={}",
            E::KIND,
            id,
            affected
        );
        Ok(())
    }

    fn list<E: Entity>(&self, query: &ListQuery) -> RepoResult<Vec<E>> {
        query.validate(E::KIND)?;
        if query.is_count_only() {
            return Err(RepoError::Query(QueryValidationError::UnsupportedFilter {
                field: "count_only",
                kind: E::KIND,
            }));
        }

        let started_at = Instant::now();
        let compiled = compile(E::KIND, self.table(E::KIND), query, &now_datetime());
        let mut stmt = self.conn.prepare(&compiled.sql)?;
        let column_names = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let mut rows = stmt.query(params_from_iter(compiled.params.iter()))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let data = read_row(row, &column_names)?;
            entities.push(E::from_record(Record::hydrated(data)));
        }

        debug!(
            "event=entity_list module=repo status=ok kind={} rows={} duration_ms={}",
            E::KIND,
            entities.len(),
            started_at.elapsed().as_millis()
        );
        Ok(entities)
    }

    fn count<E: Entity>(&self, query: &ListQuery) -> RepoResult<i64> {
        self.count_kind(E::KIND, query)
    }
}

fn changed_without_id(record: &Record) -> BTreeMap<String, String> {
    let mut changed = record.data_changed();
    changed.remove(COLUMN_ID);
    changed
}

fn ensure_known_columns<'a, I>(kind: EntityKind, columns: I) -> RepoResult<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for column in columns {
        if !kind.has_column(column) {
            return Err(RepoError::UnknownField {
                kind,
                field: column.clone(),
            });
        }
    }
    Ok(())
}

fn read_row(row: &Row<'_>, column_names: &[String]) -> RepoResult<BTreeMap<String, String>> {
    let mut data = BTreeMap::new();
    for (index, name) in column_names.iter().enumerate() {
        data.insert(name.clone(), value_to_text(row.get_ref(index)?));
    }
    Ok(data)
}

fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn ensure_table_exists(conn: &Connection, table: &str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::MissingRequiredTable(table.to_string()))
    }
}
