//! Per-request context handed to data sources.

use std::collections::BTreeMap;

use http::{Extensions, HeaderMap, Method, Uri};
use once_cell::sync::Lazy;
use regex::Regex;

static PAGE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^page\[(\w+)\]$").expect("page key pattern"));

/// The normalized inbound request a data source sees.
///
/// Built once per dispatch and read-only afterwards. `extensions` carries any
/// request-scoped values the mounting layer attached to the transport request.
#[derive(Debug, Default)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub extensions: Extensions,
    /// Query keys mapped to the comma-split parts of their first value.
    pub query_params: BTreeMap<String, Vec<String>>,
    /// Inner names of `page[...]` keys mapped to their raw first value.
    pub pagination: BTreeMap<String, String>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts) -> Self {
        let raw = parse_query(parts.uri.query().unwrap_or(""));
        let mut query_params = BTreeMap::new();
        let mut pagination = BTreeMap::new();

        for (key, values) in &raw {
            let first = values.first().cloned().unwrap_or_default();
            query_params.insert(
                key.clone(),
                first.split(',').map(str::to_string).collect(),
            );
            if let Some(caps) = PAGE_KEY.captures(key) {
                pagination.insert(caps[1].to_string(), first);
            }
        }

        Request {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            query_params,
            pagination,
        }
    }
}

/// Parse a raw query string into decoded keys and all their values.
pub(crate) fn parse_query(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        result
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    result
}

/// Percent-decode one query component; `+` counts as a space.
pub(crate) fn decode_component(component: &str) -> String {
    let component = component.replace('+', " ");
    match urlencoding::decode(&component) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => component,
    }
}
