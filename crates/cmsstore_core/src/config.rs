//! Store configuration.
//!
//! # Responsibility
//! - Carry table names and feature toggles into bootstrap and repositories.
//! - Reject table names that cannot be safely interpolated into SQL.
//!
//! # Invariants
//! - A `StoreConfig` is immutable once handed to `open_db` or a store.
//! - Every configured table name is a plain SQL identifier and unique.

use crate::model::entity::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SQL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

const DEFAULT_VERSION_TABLE: &str = "cms_versions";

/// Configuration error raised by [`StoreConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Table name is empty or contains characters outside `[A-Za-z0-9_]`.
    InvalidTableName(String),
    /// Two logical tables map onto the same physical table.
    DuplicateTableName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTableName(name) => write!(f, "invalid table name `{name}`"),
            Self::DuplicateTableName(name) => {
                write!(f, "table name `{name}` is configured more than once")
            }
        }
    }
}

impl Error for ConfigError {}

/// Immutable configuration shared by schema bootstrap and entity stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    block_table: String,
    page_table: String,
    site_table: String,
    template_table: String,
    menu_table: String,
    menu_item_table: String,
    translation_table: String,
    version_table: String,
    versioning_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            block_table: EntityKind::Block.default_table().to_string(),
            page_table: EntityKind::Page.default_table().to_string(),
            site_table: EntityKind::Site.default_table().to_string(),
            template_table: EntityKind::Template.default_table().to_string(),
            menu_table: EntityKind::Menu.default_table().to_string(),
            menu_item_table: EntityKind::MenuItem.default_table().to_string(),
            translation_table: EntityKind::Translation.default_table().to_string(),
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            versioning_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Overrides the physical table used for one entity kind.
    pub fn with_table(mut self, kind: EntityKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            EntityKind::Block => self.block_table = name,
            EntityKind::Page => self.page_table = name,
            EntityKind::Site => self.site_table = name,
            EntityKind::Template => self.template_table = name,
            EntityKind::Menu => self.menu_table = name,
            EntityKind::MenuItem => self.menu_item_table = name,
            EntityKind::Translation => self.translation_table = name,
        }
        self
    }

    /// Overrides the version snapshot table.
    pub fn with_version_table(mut self, name: impl Into<String>) -> Self {
        self.version_table = name.into();
        self
    }

    /// Enables or disables version snapshots on create/update.
    pub fn with_versioning(mut self, enabled: bool) -> Self {
        self.versioning_enabled = enabled;
        self
    }

    pub fn table_name(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Block => &self.block_table,
            EntityKind::Page => &self.page_table,
            EntityKind::Site => &self.site_table,
            EntityKind::Template => &self.template_table,
            EntityKind::Menu => &self.menu_table,
            EntityKind::MenuItem => &self.menu_item_table,
            EntityKind::Translation => &self.translation_table,
        }
    }

    pub fn version_table(&self) -> &str {
        &self.version_table
    }

    pub fn versioning_enabled(&self) -> bool {
        self.versioning_enabled
    }

    /// Checks that every table name is a safe, unique SQL identifier.
    ///
    /// # Errors
    /// - `InvalidTableName` for names outside `^[A-Za-z_][A-Za-z0-9_]*$`.
    /// - `DuplicateTableName` when two tables share one name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        let names = EntityKind::ALL
            .iter()
            .map(|kind| self.table_name(*kind))
            .chain(std::iter::once(self.version_table()));

        for name in names {
            if !SQL_IDENTIFIER_RE.is_match(name) {
                return Err(ConfigError::InvalidTableName(name.to_string()));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateTableName(name.to_string()));
            }
        }

        Ok(())
    }
}
