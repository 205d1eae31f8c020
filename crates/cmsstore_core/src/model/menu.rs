//! Menu entity.

use crate::model::entity::EntityKind;

define_entity!(
    /// Named navigation menu of a site; items live in `MenuItem`.
    Menu,
    EntityKind::Menu
);

impl Menu {
    string_field!(site_id, set_site_id, "site_id");
    string_field!(name, set_name, "name");
    string_field!(handle, set_handle, "handle");
}
