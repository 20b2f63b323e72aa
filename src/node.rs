//! JSON:API wire primitives and value-level marshaling.
//!
//! Resources travel through here as `serde_json` values: the tagged fields of
//! a shape are carved out of the serialized object, the rest stays behind as
//! attributes. Attribute order follows declaration order.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ServerInfo;
use crate::descriptor::primary_field;
use crate::error::HttpError;
use crate::relationships::apply_relationship_data;
use crate::resource::{Field, FieldTag, Resource, ShapeFn};

/// Free-form metadata attached to documents, nodes or relationships.
pub type Meta = Map<String, Value>;

/// Named links of a document, node or relationship.
pub type Links = BTreeMap<String, Link>;

/// One link value: a bare URL or an object with attached metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Url(String),
    Object {
        href: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        meta: Option<Meta>,
    },
}

impl Link {
    pub fn href(&self) -> &str {
        match self {
            Link::Url(href) => href,
            Link::Object { href, .. } => href,
        }
    }
}

/// The `{type, id}` pair identifying a resource without its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Linkage of one relationship: `null` or one identifier for to-one,
/// an array of identifiers for to-many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    ToOne(Option<ResourceIdentifier>),
    ToMany(Vec<ResourceIdentifier>),
}

/// One relationship member of a node. `data` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Links>,
    pub data: Linkage,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Meta>,
}

/// A single resource representation on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub relationships: BTreeMap<String, Relationship>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Links>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Meta>,
}

/// The shared side table of linked nodes, deduplicated first-seen by
/// `(type, id)`.
#[derive(Debug, Default)]
pub(crate) struct Included {
    seen: HashSet<(String, String)>,
    nodes: Vec<Node>,
}

impl Included {
    pub(crate) fn push(&mut self, node: Node) {
        if self.seen.insert((node.kind.clone(), node.id.clone())) {
            self.nodes.push(node);
        }
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

/// Marshal one serialized resource value into a node, collecting every linked
/// value into `included` along the way.
pub(crate) fn marshal_node(
    value: Value,
    shape: &'static [Field],
    server: &ServerInfo,
    included: &mut Included,
) -> Result<Node, HttpError> {
    let Value::Object(mut map) = value else {
        return Err(HttpError::new("resource values must serialize to objects", 500));
    };

    let (id_field, type_name) = primary_field(shape)
        .ok_or_else(|| HttpError::new("resource shape declares no primary field", 500))?;

    let id = match map.shift_remove(id_field) {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(HttpError::new(
                format!("resource of type {type_name} carries no usable {id_field} value"),
                500,
            ))
        }
    };

    let mut relationships = BTreeMap::new();
    for field in shape {
        let FieldTag::Relation { to_many, target } = field.tag else {
            continue;
        };
        let raw = map.shift_remove(field.name).unwrap_or(Value::Null);
        let data = if to_many {
            let mut identifiers = Vec::new();
            if let Value::Array(entries) = raw {
                for entry in entries {
                    identifiers.push(linked_identifier(entry, target, server, included)?);
                }
            }
            Linkage::ToMany(identifiers)
        } else {
            match raw {
                Value::Null => Linkage::ToOne(None),
                entry => Linkage::ToOne(Some(linked_identifier(entry, target, server, included)?)),
            }
        };
        relationships.insert(
            field.name.to_string(),
            Relationship {
                links: Some(relationship_links(server, type_name, &id, field.name)),
                data,
                meta: None,
            },
        );
    }

    Ok(Node {
        kind: type_name.to_string(),
        id,
        attributes: map,
        relationships,
        links: None,
        meta: None,
    })
}

fn linked_identifier(
    value: Value,
    target: ShapeFn,
    server: &ServerInfo,
    included: &mut Included,
) -> Result<ResourceIdentifier, HttpError> {
    let node = marshal_node(value, target(), server, included)?;
    let identifier = ResourceIdentifier {
        kind: node.kind.clone(),
        id: node.id.clone(),
    };
    included.push(node);
    Ok(identifier)
}

fn relationship_links(server: &ServerInfo, type_name: &str, id: &str, relation: &str) -> Links {
    let base = format!(
        "{}{}/{}/{}",
        server.base_url(),
        server.prefix_path(),
        type_name,
        id
    );
    let mut links = Links::new();
    links.insert(
        "self".to_string(),
        Link::Url(format!("{base}/relationships/{relation}")),
    );
    links.insert("related".to_string(), Link::Url(format!("{base}/{relation}")));
    links
}

/// Decode a JSON:API payload body onto an existing resource value.
///
/// Attributes merge over the current value, `data.id` applies through the id
/// seam, and `data.relationships` apply through the relationship setters.
pub(crate) fn unmarshal_payload<T: Resource>(
    body: &[u8],
    value: &mut T,
    type_name: &str,
) -> Result<(), HttpError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| HttpError::new("cannot parse the request body", 406).with_source(e))?;
    let data = payload
        .get("data")
        .ok_or_else(|| HttpError::new("the request body needs a \"data\" member", 406))?;
    let Value::Object(data) = data else {
        return Err(HttpError::new("the \"data\" member must be an object", 406));
    };

    if let Some(kind) = data.get("type") {
        if kind.as_str() != Some(type_name) {
            return Err(HttpError::new(
                format!("the payload type does not match resource type {type_name}"),
                406,
            ));
        }
    }

    let mut current = serde_json::to_value(&*value)
        .map_err(|e| HttpError::new("cannot serialize the resource value", 500).with_source(e))?;
    if let (Value::Object(map), Some(Value::Object(attributes))) =
        (&mut current, data.get("attributes"))
    {
        for (key, attribute) in attributes {
            map.insert(key.clone(), attribute.clone());
        }
    }
    *value = serde_json::from_value(current).map_err(|e| {
        HttpError::new("the request attributes do not fit the resource", 406).with_source(e)
    })?;

    if let Some(id) = data.get("id") {
        let Some(id) = id.as_str() else {
            return Err(HttpError::new("the \"id\" member must be a string", 406));
        };
        value
            .set_id(id)
            .map_err(|e| HttpError::new("cannot apply the \"id\" member", 406).with_source(e))?;
    }

    if let Some(Value::Object(relationships)) = data.get("relationships") {
        for (name, relationship) in relationships {
            let data = relationship.get("data").ok_or_else(|| {
                HttpError::new(format!("relationship {name} needs a \"data\" member"), 400)
            })?;
            apply_relationship_data(value, name, data)?;
        }
    }

    Ok(())
}
