//! Menu item entity.
//!
//! # Invariants
//! - `menu_id` is required by callers but not enforced here.
//! - Either `page_id` or `url` is the link target; both may be empty.

use crate::model::entity::EntityKind;

define_entity!(
    /// One link of a menu, optionally nested under another item.
    MenuItem,
    EntityKind::MenuItem
);

impl MenuItem {
    string_field!(menu_id, set_menu_id, "menu_id");
    string_field!(name, set_name, "name");
    string_field!(parent_id, set_parent_id, "parent_id");
    string_field!(page_id, set_page_id, "page_id");
    string_field!(url, set_url, "url");
    string_field!(target, set_target, "target");
    string_field!(handle, set_handle, "handle");

    pub fn sequence(&self) -> i64 {
        self.record.get("sequence").trim().parse().unwrap_or(0)
    }

    pub fn set_sequence(&mut self, sequence: i64) -> &mut Self {
        self.record.set("sequence", sequence.to_string());
        self
    }
}
