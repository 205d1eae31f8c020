//! Page entity.
//!
//! # Responsibility
//! - Typed facade over a page row: routing alias, template binding,
//!   content and SEO fields.
//!
//! # Invariants
//! - `alias` is either a literal path or a pattern with route tokens
//!   (see `routing::alias`).
//! - Middleware lists are stored as JSON string arrays.

use crate::model::entity::{decode_json_field, encode_json_field, EntityKind, FieldCodecError};

define_entity!(
    /// Routable content page belonging to a site.
    Page,
    EntityKind::Page
);

impl Page {
    string_field!(site_id, set_site_id, "site_id");
    string_field!(template_id, set_template_id, "template_id");
    string_field!(title, set_title, "title");
    string_field!(name, set_name, "name");
    string_field!(handle, set_handle, "handle");
    string_field!(alias, set_alias, "alias");
    string_field!(canonical_url, set_canonical_url, "canonical_url");
    string_field!(content, set_content, "content");
    string_field!(editor, set_editor, "editor");
    string_field!(meta_description, set_meta_description, "meta_description");
    string_field!(meta_keywords, set_meta_keywords, "meta_keywords");
    string_field!(meta_robots, set_meta_robots, "meta_robots");

    /// Middleware names run before rendering.
    pub fn middlewares_before(&self) -> Result<Vec<String>, FieldCodecError> {
        decode_json_field(&self.record, "middlewares_before")
    }

    pub fn set_middlewares_before(&mut self, names: &[String]) -> Result<(), FieldCodecError> {
        encode_json_field(&mut self.record, "middlewares_before", &names)
    }

    /// Middleware names run after rendering.
    pub fn middlewares_after(&self) -> Result<Vec<String>, FieldCodecError> {
        decode_json_field(&self.record, "middlewares_after")
    }

    pub fn set_middlewares_after(&mut self, names: &[String]) -> Result<(), FieldCodecError> {
        encode_json_field(&mut self.record, "middlewares_after", &names)
    }
}

#[cfg(test)]
mod tests {
    use super::Page;
    use crate::model::entity::{Entity, STATUS_ACTIVE};
    use crate::model::lifecycle::MAX_DATETIME;

    #[test]
    fn new_page_is_clean_draft_and_live() {
        let page = Page::new();
        assert!(!page.id().is_empty());
        assert_eq!(page.status(), "draft");
        assert!(!page.is_active());
        assert!(!page.is_soft_deleted());
        assert_eq!(page.soft_deleted_at(), MAX_DATETIME);
        assert!(page.record().data_changed().is_empty());
    }

    #[test]
    fn setters_mark_fields_dirty() {
        let mut page = Page::new();
        page.set_title("About").set_status(STATUS_ACTIVE);

        let changed = page.record().data_changed();
        assert_eq!(changed.len(), 2);
        assert!(page.is_active());
        assert_eq!(page.title(), "About");
    }

    #[test]
    fn middlewares_roundtrip_as_json_lists() {
        let mut page = Page::new();
        assert!(page.middlewares_before().unwrap().is_empty());

        page.set_middlewares_before(&["auth".to_string(), "csrf".to_string()])
            .unwrap();
        assert_eq!(page.record().get("middlewares_before"), r#"["auth","csrf"]"#);
        assert_eq!(page.middlewares_before().unwrap(), vec!["auth", "csrf"]);
    }

    #[test]
    fn versioned_content_excludes_audit_columns() {
        let page = Page::new();
        let content = page.to_versioned_content().unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(decoded["id"], page.id());
        assert!(decoded.get("created_at").is_none());
        assert!(decoded.get("updated_at").is_none());
        assert!(decoded.get("soft_deleted_at").is_none());
    }
}
