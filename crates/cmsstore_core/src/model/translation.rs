//! Translation entity.
//!
//! # Responsibility
//! - Hold one translatable string keyed by language code.
//!
//! # Invariants
//! - `content` is a JSON object mapping language code to text.

use crate::model::entity::{decode_json_field, encode_json_field, EntityKind, FieldCodecError};
use std::collections::BTreeMap;

define_entity!(
    /// Site-scoped translatable string.
    Translation,
    EntityKind::Translation
);

impl Translation {
    string_field!(site_id, set_site_id, "site_id");
    string_field!(name, set_name, "name");
    string_field!(handle, set_handle, "handle");

    /// Language code to text map.
    pub fn content(&self) -> Result<BTreeMap<String, String>, FieldCodecError> {
        decode_json_field(&self.record, "content")
    }

    pub fn set_content(
        &mut self,
        content: &BTreeMap<String, String>,
    ) -> Result<(), FieldCodecError> {
        encode_json_field(&mut self.record, "content", content)
    }

    /// Text for one language code, if present.
    pub fn content_for(&self, language: &str) -> Result<Option<String>, FieldCodecError> {
        Ok(self.content()?.remove(language))
    }
}

#[cfg(test)]
mod tests {
    use super::Translation;
    use std::collections::BTreeMap;

    #[test]
    fn content_is_keyed_by_language() {
        let mut translation = Translation::new();
        assert!(translation.content().unwrap().is_empty());

        let content = BTreeMap::from([
            ("en".to_string(), "Hello".to_string()),
            ("de".to_string(), "Hallo".to_string()),
        ]);
        translation.set_content(&content).unwrap();

        assert_eq!(translation.content_for("de").unwrap().as_deref(), Some("Hallo"));
        assert_eq!(translation.content_for("fr").unwrap(), None);
    }
}
