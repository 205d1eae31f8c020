//! Entity kinds, column catalogue and the shared entity contract.
//!
//! # Responsibility
//! - Enumerate the closed set of persisted entity kinds.
//! - Own the column list of each kind, used for DDL, defaults and
//!   write-path column checks.
//! - Provide the accessors shared by every entity through [`Entity`].
//!
//! # Invariants
//! - `id` is generated at construction and never rewritten by the store.
//! - Soft-delete state is derived from `soft_deleted_at` on every call.
//! - Versioned content never includes the audit timestamp columns.

use crate::model::lifecycle::{is_soft_deleted_at, now_datetime, MAX_DATETIME};
use crate::model::record::Record;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const COLUMN_ID: &str = "id";
pub const COLUMN_STATUS: &str = "status";
pub const COLUMN_METAS: &str = "metas";
pub const COLUMN_MEMO: &str = "memo";
pub const COLUMN_CREATED_AT: &str = "created_at";
pub const COLUMN_UPDATED_AT: &str = "updated_at";
pub const COLUMN_SOFT_DELETED_AT: &str = "soft_deleted_at";

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_DRAFT: &str = "draft";

/// Columns excluded from versioned content; they change on every write.
pub const AUDIT_COLUMNS: [&str; 3] = [COLUMN_CREATED_AT, COLUMN_UPDATED_AT, COLUMN_SOFT_DELETED_AT];

const BLOCK_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "site_id", "page_id", "template_id", "type", "name", "content", "editor", "handle",
    "parent_id", "sequence",
];

const PAGE_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "site_id", "template_id", "title", "name", "handle", "alias", "canonical_url", "content",
    "editor", "meta_description", "meta_keywords", "meta_robots", "middlewares_before",
    "middlewares_after",
];

const SITE_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "name", "handle", "domain_names",
];

const TEMPLATE_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "site_id", "name", "content", "editor", "handle",
];

const MENU_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "site_id", "name", "handle",
];

const MENU_ITEM_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "menu_id", "name", "parent_id", "sequence", "page_id", "url", "target", "handle",
];

const TRANSLATION_COLUMNS: &[&str] = &[
    "id", "status", "metas", "memo", "created_at", "updated_at", "soft_deleted_at",
    "site_id", "name", "handle", "content",
];

/// Closed set of persisted entity kinds.
///
/// The serialized name doubles as the `entity_type` tag of version snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Block,
    Page,
    Site,
    Template,
    Menu,
    MenuItem,
    Translation,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        Self::Block,
        Self::Page,
        Self::Site,
        Self::Template,
        Self::Menu,
        Self::MenuItem,
        Self::Translation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Page => "page",
            Self::Site => "site",
            Self::Template => "template",
            Self::Menu => "menu",
            Self::MenuItem => "menu_item",
            Self::Translation => "translation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn default_table(self) -> &'static str {
        match self {
            Self::Block => "cms_blocks",
            Self::Page => "cms_pages",
            Self::Site => "cms_sites",
            Self::Template => "cms_templates",
            Self::Menu => "cms_menus",
            Self::MenuItem => "cms_menu_items",
            Self::Translation => "cms_translations",
        }
    }

    /// Full persisted column list, shared prefix first.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Block => BLOCK_COLUMNS,
            Self::Page => PAGE_COLUMNS,
            Self::Site => SITE_COLUMNS,
            Self::Template => TEMPLATE_COLUMNS,
            Self::Menu => MENU_COLUMNS,
            Self::MenuItem => MENU_ITEM_COLUMNS,
            Self::Translation => TRANSLATION_COLUMNS,
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Value a freshly constructed entity carries for `column`.
    pub fn default_value(self, column: &str) -> String {
        match column {
            COLUMN_ID => Uuid::new_v4().simple().to_string(),
            COLUMN_STATUS => STATUS_DRAFT.to_string(),
            COLUMN_CREATED_AT | COLUMN_UPDATED_AT => now_datetime(),
            COLUMN_SOFT_DELETED_AT => MAX_DATETIME.to_string(),
            COLUMN_METAS => "{}".to_string(),
            "sequence" => "0".to_string(),
            "domain_names" | "middlewares_before" | "middlewares_after" => "[]".to_string(),
            "content" if self == Self::Translation => "{}".to_string(),
            _ => String::new(),
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error decoding or encoding a JSON-valued field.
#[derive(Debug)]
pub struct FieldCodecError {
    pub field: &'static str,
    pub source: serde_json::Error,
}

impl Display for FieldCodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid JSON in field `{}`: {}", self.field, self.source)
    }
}

impl Error for FieldCodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

pub(crate) fn decode_json_field<T>(
    record: &Record,
    field: &'static str,
) -> Result<T, FieldCodecError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let raw = record.get(field);
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw).map_err(|source| FieldCodecError { field, source })
}

pub(crate) fn encode_json_field<T>(
    record: &mut Record,
    field: &'static str,
    value: &T,
) -> Result<(), FieldCodecError>
where
    T: Serialize,
{
    let encoded = serde_json::to_string(value).map_err(|source| FieldCodecError { field, source })?;
    record.set(field, encoded);
    Ok(())
}

/// Contract shared by every persisted entity.
///
/// Implementors are thin typed facades over one [`Record`]; all state lives
/// in the record so the store can compute partial updates.
pub trait Entity: Sized {
    const KIND: EntityKind;

    /// Wraps an existing record without touching its dirty set.
    fn from_record(record: Record) -> Self;
    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;

    fn id(&self) -> &str {
        self.record().get(COLUMN_ID)
    }

    fn status(&self) -> &str {
        self.record().get(COLUMN_STATUS)
    }

    fn set_status(&mut self, status: impl Into<String>) -> &mut Self {
        self.record_mut().set(COLUMN_STATUS, status);
        self
    }

    fn is_active(&self) -> bool {
        self.status() == STATUS_ACTIVE
    }

    fn is_inactive(&self) -> bool {
        self.status() == STATUS_INACTIVE
    }

    /// Soft-delete state at the current wall-clock time.
    fn is_soft_deleted(&self) -> bool {
        self.is_soft_deleted_at(Utc::now().naive_utc())
    }

    fn is_soft_deleted_at(&self, now: NaiveDateTime) -> bool {
        is_soft_deleted_at(self.soft_deleted_at(), now)
    }

    fn created_at(&self) -> &str {
        self.record().get(COLUMN_CREATED_AT)
    }

    fn set_created_at(&mut self, value: impl Into<String>) -> &mut Self {
        self.record_mut().set(COLUMN_CREATED_AT, value);
        self
    }

    fn updated_at(&self) -> &str {
        self.record().get(COLUMN_UPDATED_AT)
    }

    fn set_updated_at(&mut self, value: impl Into<String>) -> &mut Self {
        self.record_mut().set(COLUMN_UPDATED_AT, value);
        self
    }

    fn soft_deleted_at(&self) -> &str {
        self.record().get(COLUMN_SOFT_DELETED_AT)
    }

    fn set_soft_deleted_at(&mut self, value: impl Into<String>) -> &mut Self {
        self.record_mut().set(COLUMN_SOFT_DELETED_AT, value);
        self
    }

    fn memo(&self) -> &str {
        self.record().get(COLUMN_MEMO)
    }

    fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.record_mut().set(COLUMN_MEMO, memo);
        self
    }

    fn metas(&self) -> Result<BTreeMap<String, String>, FieldCodecError> {
        decode_json_field(self.record(), COLUMN_METAS)
    }

    fn set_metas(&mut self, metas: &BTreeMap<String, String>) -> Result<(), FieldCodecError> {
        encode_json_field(self.record_mut(), COLUMN_METAS, metas)
    }

    fn meta(&self, key: &str) -> Result<Option<String>, FieldCodecError> {
        Ok(self.metas()?.remove(key))
    }

    /// Upserts one meta entry, keeping the others.
    fn set_meta(&mut self, key: &str, value: &str) -> Result<(), FieldCodecError> {
        let mut metas = self.metas()?;
        metas.insert(key.to_string(), value.to_string());
        self.set_metas(&metas)
    }

    /// Canonical JSON of all persistable fields except the audit timestamps.
    fn to_versioned_content(&self) -> Result<String, FieldCodecError> {
        let content: BTreeMap<&str, &str> = self
            .record()
            .data()
            .iter()
            .filter(|(key, _)| !AUDIT_COLUMNS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        serde_json::to_string(&content).map_err(|source| FieldCodecError {
            field: "content",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, COLUMN_ID, STATUS_DRAFT};

    #[test]
    fn every_kind_shares_the_common_prefix() {
        for kind in EntityKind::ALL {
            assert_eq!(&kind.columns()[..7], EntityKind::Site.columns().get(..7).unwrap());
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn default_values_follow_column_semantics() {
        let id = EntityKind::Page.default_value(COLUMN_ID);
        assert_eq!(id.len(), 32);
        assert_ne!(id, EntityKind::Page.default_value(COLUMN_ID));
        assert_eq!(EntityKind::Page.default_value("status"), STATUS_DRAFT);
        assert_eq!(EntityKind::Translation.default_value("content"), "{}");
        assert_eq!(EntityKind::Block.default_value("content"), "");
    }

    #[test]
    fn has_column_is_kind_specific() {
        assert!(EntityKind::Page.has_column("alias"));
        assert!(!EntityKind::Block.has_column("alias"));
        assert!(EntityKind::MenuItem.has_column("menu_id"));
        assert!(!EntityKind::Site.has_column("site_id"));
    }
}
