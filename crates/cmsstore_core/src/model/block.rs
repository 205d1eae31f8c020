//! Block entity: a reusable content fragment, optionally bound to a page.

use crate::model::entity::EntityKind;

define_entity!(
    /// Content fragment scoped to a site, optionally nested and page-bound.
    Block,
    EntityKind::Block
);

impl Block {
    string_field!(site_id, set_site_id, "site_id");
    string_field!(page_id, set_page_id, "page_id");
    string_field!(template_id, set_template_id, "template_id");
    string_field!(block_type, set_block_type, "type");
    string_field!(name, set_name, "name");
    string_field!(content, set_content, "content");
    string_field!(editor, set_editor, "editor");
    string_field!(handle, set_handle, "handle");
    string_field!(parent_id, set_parent_id, "parent_id");

    /// Ordering key among siblings; `0` when the stored value is not numeric.
    pub fn sequence(&self) -> i64 {
        self.record.get("sequence").trim().parse().unwrap_or(0)
    }

    pub fn set_sequence(&mut self, sequence: i64) -> &mut Self {
        self.record.set("sequence", sequence.to_string());
        self
    }
}
