//! Site entity.
//!
//! # Invariants
//! - `domain_names` is a JSON string array; lookups compare names
//!   case-insensitively.

use crate::model::entity::{decode_json_field, encode_json_field, EntityKind, FieldCodecError};

define_entity!(
    /// Top-level scope for pages, blocks, templates, menus and translations.
    Site,
    EntityKind::Site
);

impl Site {
    string_field!(name, set_name, "name");
    string_field!(handle, set_handle, "handle");

    pub fn domain_names(&self) -> Result<Vec<String>, FieldCodecError> {
        decode_json_field(&self.record, "domain_names")
    }

    pub fn set_domain_names(&mut self, domains: &[String]) -> Result<(), FieldCodecError> {
        encode_json_field(&mut self.record, "domain_names", &domains)
    }

    /// Returns whether `domain` is one of this site's domain names.
    pub fn serves_domain(&self, domain: &str) -> Result<bool, FieldCodecError> {
        Ok(self
            .domain_names()?
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(domain.trim())))
    }
}
