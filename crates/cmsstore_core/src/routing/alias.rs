//! Alias pattern routing.
//!
//! # Responsibility
//! - Turn templated page aliases such as `/blog/:num` into anchored regexes.
//! - Resolve an inbound path to the page whose pattern matches it.
//!
//! # Invariants
//! - Aliases without a route token are never treated as patterns.
//! - Literal alias text is regex-escaped; only tokens become groups.
//! - Candidates are scanned in ascending page id order, so when several
//!   patterns match, the lowest page id wins.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Route tokens and the regex fragment each one expands to.
pub const ROUTE_TOKENS: [(&str, &str); 7] = [
    (":any", "([^/]+)"),
    (":num", "([0-9]+)"),
    (":all", "(.*)"),
    (":string", "([a-zA-Z]+)"),
    (":number", "([0-9]+)"),
    (":numeric", "([0-9-.]+)"),
    (":alpha", "([a-zA-Z0-9-_]+)"),
];

// Longest first so `:number` is not consumed as `:num` + `ber`.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let mut tokens = ROUTE_TOKENS
        .iter()
        .map(|(token, _)| regex::escape(token))
        .collect::<Vec<_>>();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()));
    Regex::new(&tokens.join("|")).expect("valid route token regex")
});

/// Returns whether `alias` contains at least one route token.
pub fn has_tokens(alias: &str) -> bool {
    TOKEN_RE.is_match(alias)
}

/// Expands the route tokens of `alias` and anchors the result.
///
/// `"/blog/:num"` becomes `^/blog/([0-9]+)$`.
pub fn alias_to_pattern(alias: &str) -> String {
    let mut pattern = String::from("^");
    let mut last = 0;
    for token in TOKEN_RE.find_iter(alias) {
        pattern.push_str(&regex::escape(&alias[last..token.start()]));
        pattern.push_str(token_fragment(token.as_str()));
        last = token.end();
    }
    pattern.push_str(&regex::escape(&alias[last..]));
    pattern.push('$');
    pattern
}

/// Compiles `alias` into an anchored regex, or `None` for literal aliases.
pub fn alias_to_regex(alias: &str) -> Option<Regex> {
    if !has_tokens(alias) {
        return None;
    }
    match Regex::new(&alias_to_pattern(alias)) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("event=alias_compile module=routing status=error error={err}");
            None
        }
    }
}

/// Finds the first page (by ascending id) whose templated alias matches `path`.
pub fn resolve_page_id<'a>(aliases: &'a BTreeMap<String, String>, path: &str) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|(page_id, alias)| alias_to_regex(alias).map(|regex| (page_id, regex)))
        .find(|(_, regex)| regex.is_match(path))
        .map(|(page_id, _)| page_id.as_str())
}

fn token_fragment(token: &str) -> &'static str {
    ROUTE_TOKENS
        .iter()
        .find(|(name, _)| *name == token)
        .map_or("", |(_, fragment)| *fragment)
}

#[cfg(test)]
mod tests {
    use super::{alias_to_pattern, alias_to_regex, has_tokens, resolve_page_id};
    use std::collections::BTreeMap;

    #[test]
    fn num_token_expands_to_digit_group() {
        assert_eq!(alias_to_pattern("/blog/:num"), "^/blog/([0-9]+)$");

        let regex = alias_to_regex("/blog/:num").unwrap();
        assert!(regex.is_match("/blog/42"));
        assert!(!regex.is_match("/blog/abc"));
        assert!(!regex.is_match("/blog/42/extra"));
    }

    #[test]
    fn longer_tokens_are_not_split() {
        assert_eq!(alias_to_pattern("/n/:number"), "^/n/([0-9]+)$");
        assert_eq!(alias_to_pattern("/n/:numeric"), "^/n/([0-9-.]+)$");
        assert_eq!(alias_to_pattern("/:string/:alpha"), "^/([a-zA-Z]+)/([a-zA-Z0-9-_]+)$");
    }

    #[test]
    fn literal_text_is_escaped() {
        let regex = alias_to_regex("/file.html/:any").unwrap();
        assert!(regex.is_match("/file.html/x"));
        assert!(!regex.is_match("/fileXhtml/x"));
    }

    #[test]
    fn all_token_spans_segments() {
        let regex = alias_to_regex("/docs/:all").unwrap();
        assert!(regex.is_match("/docs/a/b/c"));
        assert!(regex.is_match("/docs/"));
    }

    #[test]
    fn literal_aliases_are_not_patterns() {
        assert!(!has_tokens("/about"));
        assert!(alias_to_regex("/about").is_none());

        let aliases = BTreeMap::from([("p1".to_string(), "/about".to_string())]);
        assert_eq!(resolve_page_id(&aliases, "/about"), None);
    }

    #[test]
    fn overlapping_patterns_resolve_to_lowest_id() {
        let aliases = BTreeMap::from([
            ("b-page".to_string(), "/item/:any".to_string()),
            ("a-page".to_string(), "/item/:num".to_string()),
        ]);
        assert_eq!(resolve_page_id(&aliases, "/item/7"), Some("a-page"));
        assert_eq!(resolve_page_id(&aliases, "/item/seven"), Some("b-page"));
        assert_eq!(resolve_page_id(&aliases, "/other/7"), None);
    }
}
