//! Persistence engine for a small content-management system.
//!
//! Sites, pages, templates, blocks, menus, menu items and translations are
//! stored through one generic, change-tracking entity store over SQLite,
//! with soft-delete visibility, optional content-deduplicated versioning
//! and alias pattern routing.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod routing;
pub mod service;
pub mod versioning;

pub use config::{ConfigError, StoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::block::Block;
pub use model::entity::{Entity, EntityKind, FieldCodecError};
pub use model::menu::Menu;
pub use model::menu_item::MenuItem;
pub use model::page::Page;
pub use model::record::Record;
pub use model::site::Site;
pub use model::template::Template;
pub use model::translation::Translation;
pub use query::list_query::{ListQuery, QueryValidationError};
pub use repo::entity_repo::{EntityStore, RepoError, RepoResult, SqliteEntityStore};
pub use repo::version_repo::SqliteVersionStore;
pub use service::route_service::RouteService;
pub use versioning::{VersionSnapshot, VersionStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
