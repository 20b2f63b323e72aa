//! Top-level JSON:API documents and their assembly from capability results.

use serde::{Deserialize, Serialize};

use crate::api::ServerInfo;
use crate::error::HttpError;
use crate::node::{marshal_node, Included, Links, Meta, Node};
use crate::resource::Resource;

/// The top-level envelope: one node or a collection of nodes.
///
/// The two variants serialize to distinct shapes. A missing single resource
/// is `{"data": null}`, an empty collection is `{"data": []}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    One(OnePayload),
    Many(ManyPayload),
}

/// Envelope body for a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnePayload {
    pub data: Option<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub included: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Links>,
}

/// Envelope body for a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManyPayload {
    pub data: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub included: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Links>,
}

impl Document {
    /// The canonical representation of a missing single resource.
    pub fn empty_one() -> Self {
        Document::One(OnePayload {
            data: None,
            included: Vec::new(),
            meta: None,
            links: None,
        })
    }

    /// The canonical representation of an empty collection.
    pub fn empty_many() -> Self {
        Document::Many(ManyPayload {
            data: Vec::new(),
            included: Vec::new(),
            meta: None,
            links: None,
        })
    }

    pub fn node(&self) -> Option<&Node> {
        match self {
            Document::One(payload) => payload.data.as_ref(),
            Document::Many(_) => None,
        }
    }

    pub fn nodes(&self) -> Option<&[Node]> {
        match self {
            Document::One(_) => None,
            Document::Many(payload) => Some(&payload.data),
        }
    }

    pub fn included(&self) -> &[Node] {
        match self {
            Document::One(payload) => &payload.included,
            Document::Many(payload) => &payload.included,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Document::One(payload) => payload.meta.as_ref(),
            Document::Many(payload) => payload.meta.as_ref(),
        }
    }

    /// Set the document metadata. The last explicit call wins.
    pub fn set_meta(&mut self, meta: Meta) {
        match self {
            Document::One(payload) => payload.meta = Some(meta),
            Document::Many(payload) => payload.meta = Some(meta),
        }
    }

    pub fn links(&self) -> Option<&Links> {
        match self {
            Document::One(payload) => payload.links.as_ref(),
            Document::Many(payload) => payload.links.as_ref(),
        }
    }

    /// Set the document links. The last explicit call wins.
    pub fn set_links(&mut self, links: Links) {
        match self {
            Document::One(payload) => payload.links = Some(links),
            Document::Many(payload) => payload.links = Some(links),
        }
    }

    /// Run `f` over the primary node or nodes and every included node.
    pub(crate) fn for_each_node_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        match self {
            Document::One(payload) => {
                if let Some(node) = &mut payload.data {
                    f(node);
                }
                for node in &mut payload.included {
                    f(node);
                }
            }
            Document::Many(payload) => {
                for node in &mut payload.data {
                    f(node);
                }
                for node in &mut payload.included {
                    f(node);
                }
            }
        }
    }
}

/// Meta-only body, used for deletes that answer 200 with metadata.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MetaDocument {
    pub meta: Meta,
}

/// Wrap an optional single result into a document.
pub(crate) fn assemble_one<T: Resource>(
    result: Option<&T>,
    server: &ServerInfo,
) -> Result<Document, HttpError> {
    let Some(value) = result else {
        return Ok(Document::empty_one());
    };
    let mut included = Included::default();
    let value = serialize_resource(value)?;
    let node = marshal_node(value, T::shape(), server, &mut included)?;
    let included = prune_primary(included.into_nodes(), std::slice::from_ref(&node));
    Ok(Document::One(OnePayload {
        data: Some(node),
        included,
        meta: None,
        links: None,
    }))
}

/// Wrap a collection result into a document. Every element marshals
/// independently; the included table is shared across all of them.
pub(crate) fn assemble_many<T: Resource>(
    results: &[T],
    server: &ServerInfo,
) -> Result<Document, HttpError> {
    if results.is_empty() {
        return Ok(Document::empty_many());
    }
    let mut included = Included::default();
    let mut nodes = Vec::with_capacity(results.len());
    for value in results {
        let value = serialize_resource(value)?;
        nodes.push(marshal_node(value, T::shape(), server, &mut included)?);
    }
    let included = prune_primary(included.into_nodes(), &nodes);
    Ok(Document::Many(ManyPayload {
        data: nodes,
        included,
        meta: None,
        links: None,
    }))
}

/// Attach responder metadata and links when present and non-empty.
pub(crate) fn attach(document: &mut Document, meta: Option<Meta>, links: Option<Links>) {
    if let Some(meta) = meta {
        if !meta.is_empty() {
            document.set_meta(meta);
        }
    }
    if let Some(links) = links {
        if !links.is_empty() {
            document.set_links(links);
        }
    }
}

fn serialize_resource<T: Resource>(value: &T) -> Result<serde_json::Value, HttpError> {
    serde_json::to_value(value)
        .map_err(|e| HttpError::new("cannot serialize the resource value", 500).with_source(e))
}

/// Included nodes must not duplicate primary data.
fn prune_primary(mut included: Vec<Node>, primary: &[Node]) -> Vec<Node> {
    let keys: std::collections::HashSet<(&str, &str)> = primary
        .iter()
        .map(|node| (node.kind.as_str(), node.id.as_str()))
        .collect();
    included.retain(|node| !keys.contains(&(node.kind.as_str(), node.id.as_str())));
    included
}
