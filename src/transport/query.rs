//! Canonical query-string construction.
//!
//! Keys and values are percent-encoded independently, turned into `key` or
//! `key=value` tokens, sorted by their encoded bytes and joined with `&`.
//! The output depends only on the map's content, never on its iteration order.

use std::collections::HashMap;

/// Percent-encode a string the way `encodeURIComponent` does, except that
/// `!'()*` are encoded too. A space becomes `%20`, never `+`.
pub fn url_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the canonical query string for `params`.
///
/// Empty keys are skipped. An empty value produces a bare `key` token.
pub fn canonical_query_string(params: &HashMap<String, String>) -> String {
    let mut tokens: Vec<String> = params
        .iter()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| {
            if v.is_empty() {
                url_encode(k)
            } else {
                format!("{}={}", url_encode(k), url_encode(v))
            }
        })
        .collect();

    tokens.sort_unstable();
    tokens.join("&")
}
