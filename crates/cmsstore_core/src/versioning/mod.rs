//! Content-deduplicated version snapshots.
//!
//! # Responsibility
//! - Define the snapshot record and the storage contract behind it.
//! - Decide whether new content deserves a snapshot.
//!
//! # Invariants
//! - Snapshots for one `(entity_type, entity_id)` form an append-only log
//!   ordered by creation.
//! - A snapshot is appended only when its content differs byte-for-byte from
//!   the most recent live snapshot of the same entity.

use crate::model::entity::EntityKind;
use crate::model::lifecycle::{now_datetime, MAX_DATETIME};
use crate::repo::entity_repo::RepoResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable capture of one entity's versioned content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub content: String,
    pub created_at: String,
    pub soft_deleted_at: String,
}

impl VersionSnapshot {
    /// Creates a live snapshot stamped with the current time.
    pub fn new(kind: EntityKind, entity_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            entity_type: kind,
            entity_id: entity_id.into(),
            content: content.into(),
            created_at: now_datetime(),
            soft_deleted_at: MAX_DATETIME.to_string(),
        }
    }
}

/// Storage contract for version snapshots.
pub trait VersionStore {
    /// Appends one snapshot.
    fn create_version(&self, snapshot: &VersionSnapshot) -> RepoResult<()>;
    /// Most recent live snapshot for one entity, if any.
    fn latest_version(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> RepoResult<Option<VersionSnapshot>>;
    /// Live snapshots for one entity, newest first.
    fn list_versions(&self, kind: EntityKind, entity_id: &str) -> RepoResult<Vec<VersionSnapshot>>;
    /// Soft-deletes every live snapshot of one entity; returns the row count.
    fn soft_delete_versions(&self, kind: EntityKind, entity_id: &str) -> RepoResult<usize>;
}

/// Returns whether `content` differs from the latest snapshot of the entity.
pub fn should_snapshot<S: VersionStore + ?Sized>(
    store: &S,
    kind: EntityKind,
    entity_id: &str,
    content: &str,
) -> RepoResult<bool> {
    match store.latest_version(kind, entity_id)? {
        Some(latest) => Ok(latest.content.as_bytes() != content.as_bytes()),
        None => Ok(true),
    }
}

/// Appends a snapshot when [`should_snapshot`] says so.
///
/// Returns `true` when a snapshot was written.
pub fn record_snapshot<S: VersionStore + ?Sized>(
    store: &S,
    kind: EntityKind,
    entity_id: &str,
    content: &str,
) -> RepoResult<bool> {
    if !should_snapshot(store, kind, entity_id, content)? {
        return Ok(false);
    }
    store.create_version(&VersionSnapshot::new(kind, entity_id, content))?;
    Ok(true)
}
