//! Relationship edit payloads: the `"data"` grammar and its application.

use serde_json::Value;

use crate::error::{HttpError, ResourceError};
use crate::resource::Resource;

/// Apply one relationship `"data"` value to a resource.
///
/// An object with an `"id"` sets the to-one reference, `null` clears it, and
/// an array of `{"id", "type"}` objects replaces the to-many references.
/// Nothing is applied when any part of the payload is malformed.
pub(crate) fn apply_relationship_data<T: Resource>(
    target: &mut T,
    name: &str,
    data: &Value,
) -> Result<(), HttpError> {
    match data {
        Value::Object(map) => {
            let id = map.get("id").and_then(Value::as_str).ok_or_else(|| {
                HttpError::new(
                    format!("the data object for relationship {name} needs an \"id\" member"),
                    400,
                )
            })?;
            target.set_to_one_id(name, id).map_err(contract_violation)
        }
        Value::Null => target.set_to_one_id(name, "").map_err(contract_violation),
        Value::Array(entries) => {
            let ids = collect_ids(entries, name)?;
            target.set_to_many_ids(name, ids).map_err(contract_violation)
        }
        _ => Err(HttpError::new(
            format!(
                "relationship {name} takes an object, null or an array of objects with \"id\" and \"type\" members"
            ),
            400,
        )),
    }
}

/// Extract the ordered id list from a to-many `"data"` array.
pub(crate) fn collect_ids(entries: &[Value], name: &str) -> Result<Vec<String>, HttpError> {
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::Object(map) = entry else {
            return Err(HttpError::new(
                format!("every entry in the data array for relationship {name} must be an object"),
                400,
            ));
        };
        let id = map.get("id").and_then(Value::as_str).ok_or_else(|| {
            HttpError::new(
                format!("every data object for relationship {name} needs an \"id\" member"),
                400,
            )
        })?;
        ids.push(id.to_string());
    }
    Ok(ids)
}

/// A setter seam the resource does not support. The payload was fine, the
/// implementation is not, so this surfaces as a server error.
pub(crate) fn contract_violation(err: ResourceError) -> HttpError {
    HttpError::new(err.to_string(), 500).with_source(err)
}
