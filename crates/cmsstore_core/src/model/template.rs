//! Template entity: the layout a page renders into.

use crate::model::entity::EntityKind;

define_entity!(
    /// Site-scoped layout template.
    Template,
    EntityKind::Template
);

impl Template {
    string_field!(site_id, set_site_id, "site_id");
    string_field!(name, set_name, "name");
    string_field!(content, set_content, "content");
    string_field!(editor, set_editor, "editor");
    string_field!(handle, set_handle, "handle");
}
