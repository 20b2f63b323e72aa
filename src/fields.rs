//! Sparse fieldsets: post-filtering document attributes per `fields[type]`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Map;

use crate::document::Document;
use crate::error::{ErrorObject, HttpError};

static FIELDS_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^fields\[(\w+)\]$").expect("fields key pattern"));

/// Application code carried by invalid sparse fieldset errors.
pub const CODE_INVALID_QUERY_FIELDS: &str = "INVALID_FIELD_QUERY_PARAM";

/// Extract requested fieldsets per type from the comma-split query params.
pub(crate) fn sparse_fields(
    query_params: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    let mut result = BTreeMap::new();
    for (key, values) in query_params {
        if let Some(caps) = FIELDS_KEY.captures(key) {
            result.insert(caps[1].to_string(), values.clone());
        }
    }
    result
}

/// Restrict the attributes of every node whose type has a requested fieldset.
///
/// Applies to the primary node or nodes and the included table alike. When
/// any requested field does not exist on a node, nothing is filtered and one
/// aggregated 400 lists every `(type, field)` violation.
pub(crate) fn filter_document(
    document: &mut Document,
    fields: &BTreeMap<String, Vec<String>>,
) -> Result<(), HttpError> {
    let mut invalid: BTreeMap<String, Vec<String>> = BTreeMap::new();

    document.for_each_node_mut(&mut |node| {
        let Some(requested) = fields.get(&node.kind) else {
            return;
        };
        if requested.is_empty() || node.attributes.is_empty() {
            return;
        }
        let mut filtered = Map::new();
        let mut wrong = Vec::new();
        for field in requested {
            match node.attributes.get(field) {
                Some(value) => {
                    filtered.insert(field.clone(), value.clone());
                }
                None => wrong.push(field.clone()),
            }
        }
        if wrong.is_empty() {
            node.attributes = filtered;
        } else {
            invalid.insert(node.kind.clone(), wrong);
        }
    });

    if invalid.is_empty() {
        return Ok(());
    }

    let mut err = HttpError::new("some requested fields are invalid", 400);
    for (kind, fields) in invalid {
        for field in fields {
            err.push_error(ErrorObject {
                title: format!("field \"{field}\" does not exist for type \"{kind}\""),
                status: "400".to_string(),
                code: Some(CODE_INVALID_QUERY_FIELDS.to_string()),
                detail: Some("request only fields that exist for the type".to_string()),
            });
        }
    }
    Err(err)
}
