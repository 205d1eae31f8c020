//! Content-management domain model.
//!
//! # Responsibility
//! - Define the change-tracking record every entity is built on.
//! - Define the seven entity facades and their shared contract.
//! - Own the soft-delete sentinel and datetime text conventions.
//!
//! # Invariants
//! - Every entity is identified by an opaque, immutable string id.
//! - Deletion defaults to a soft-delete timestamp; hard delete is explicit.

/// Declares an entity facade over one [`record::Record`].
macro_rules! define_entity {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            record: $crate::model::record::Record,
        }

        impl $name {
            /// Creates a new entity with a generated id and column defaults.
            ///
            /// The returned entity has no dirty fields.
            pub fn new() -> Self {
                Self {
                    record: $crate::model::record::Record::with_defaults($kind),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::model::entity::Entity for $name {
            const KIND: $crate::model::entity::EntityKind = $kind;

            fn from_record(record: $crate::model::record::Record) -> Self {
                Self { record }
            }

            fn record(&self) -> &$crate::model::record::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::model::record::Record {
                &mut self.record
            }
        }
    };
}

/// Generates a plain string getter/setter pair for one column.
macro_rules! string_field {
    ($getter:ident, $setter:ident, $column:literal) => {
        pub fn $getter(&self) -> &str {
            self.record.get($column)
        }

        pub fn $setter(&mut self, value: impl Into<String>) -> &mut Self {
            self.record.set($column, value);
            self
        }
    };
}

pub mod block;
pub mod entity;
pub mod lifecycle;
pub mod menu;
pub mod menu_item;
pub mod page;
pub mod record;
pub mod site;
pub mod template;
pub mod translation;
