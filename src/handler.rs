//! Per-resource protocol handling with strict status-code contracts.
//!
//! A [`Binding`] pairs one resource type with its data source behind the
//! object-safe [`ResourceHandler`] seam, so the registry can dispatch to any
//! resource uniformly. Status codes outside an action's contract indicate a
//! misbehaving source and fail the request as a server error.

use std::marker::PhantomData;

use http::StatusCode;
use serde_json::Value;

use crate::api::ServerInfo;
use crate::descriptor::{self, Relation, ResourceDescriptor};
use crate::document::{assemble_many, assemble_one, attach, Document};
use crate::error::{ConfigError, HttpError};
use crate::node::{unmarshal_payload, Meta, Relationship};
use crate::pagination::PageQuery;
use crate::relationships::{apply_relationship_data, collect_ids, contract_violation};
use crate::request::Request;
use crate::resource::Resource;
use crate::source::{Capabilities, DataSource, Response};

/// Everything one action invocation needs.
pub(crate) struct RequestContext<'a> {
    pub request: Request,
    pub body: &'a [u8],
    pub id: Option<String>,
    pub relation: Option<&'a Relation>,
    pub server: &'a ServerInfo,
}

/// The body of a successful action.
pub(crate) enum ResponseBody {
    Document(Document),
    Relationship(Relationship),
    Meta(Meta),
}

/// The rendered result of an action: a status, an optional body, and an
/// optional `Location` header value.
pub(crate) struct Outcome {
    pub status: StatusCode,
    pub body: Option<ResponseBody>,
    pub location: Option<String>,
}

impl Outcome {
    fn document(status: StatusCode, document: Document) -> Self {
        Outcome {
            status,
            body: Some(ResponseBody::Document(document)),
            location: None,
        }
    }

    fn empty(status: StatusCode) -> Self {
        Outcome {
            status,
            body: None,
            location: None,
        }
    }
}

/// The object-safe face of a bound resource.
pub(crate) trait ResourceHandler: Send + Sync {
    fn descriptor(&self) -> &ResourceDescriptor;
    fn capabilities(&self) -> Capabilities;

    fn index(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn read(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn create(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn update(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn delete(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn read_relationship(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn replace_relationship(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn add_to_many(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
    fn remove_to_many(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError>;
}

/// One resource type bound to its data source.
pub(crate) struct Binding<T: Resource, S: DataSource<T>> {
    source: S,
    descriptor: ResourceDescriptor,
    capabilities: Capabilities,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource, S: DataSource<T>> Binding<T, S> {
    pub(crate) fn new(source: S) -> Result<Self, ConfigError> {
        let descriptor = descriptor::resolve::<T>()?;
        let capabilities = source.capabilities();
        Ok(Binding {
            source,
            descriptor,
            capabilities,
            _resource: PhantomData,
        })
    }

    fn require_id<'c>(&self, ctx: &'c RequestContext<'_>) -> Result<&'c str, HttpError> {
        ctx.id
            .as_deref()
            .ok_or_else(|| HttpError::new("the matched route carries no id segment", 500))
    }

    fn require_relation<'c>(&self, ctx: &'c RequestContext<'_>) -> Result<&'c Relation, HttpError> {
        ctx.relation
            .ok_or_else(|| HttpError::new("the matched route carries no relationship", 500))
    }

    /// Fetch the current value of `id`, requiring a result.
    fn fetch_existing(&self, id: &str, ctx: &RequestContext<'_>) -> Result<T, HttpError> {
        let response = self.source.find_one(id, &ctx.request)?;
        response.result.ok_or_else(|| {
            HttpError::new(
                format!(
                    "expected find_one to return a value for resource {}",
                    self.descriptor.name
                ),
                500,
            )
        })
    }

    /// Assemble a responder into a document outcome with the given status.
    fn respond(
        &self,
        response: Response<T>,
        status: StatusCode,
        ctx: &RequestContext<'_>,
    ) -> Result<Outcome, HttpError> {
        let mut document = assemble_one(response.result.as_ref(), ctx.server)?;
        attach(&mut document, response.meta, response.links);
        Ok(Outcome::document(status, document))
    }

    /// The edit payload of a relationship route: the `"data"` member of the
    /// request body.
    fn edit_payload(&self, ctx: &RequestContext<'_>) -> Result<Value, HttpError> {
        let payload: Value = serde_json::from_slice(ctx.body)
            .map_err(|e| HttpError::new("cannot parse the request body", 400).with_source(e))?;
        payload
            .get("data")
            .cloned()
            .ok_or_else(|| HttpError::new("the request body needs a \"data\" member", 400))
    }

    fn invalid_status(&self, status: StatusCode, action: &str) -> HttpError {
        HttpError::new(
            format!(
                "invalid status code {} from resource {} for {action}",
                status.as_u16(),
                self.descriptor.name
            ),
            500,
        )
    }
}

impl<T: Resource, S: DataSource<T>> ResourceHandler for Binding<T, S> {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn index(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        if self.capabilities.paginated_find_all {
            let page = PageQuery::from_request(&ctx.request);
            if page.is_valid() {
                let (count, response) = self.source.paginated_find_all(&ctx.request)?;
                let links = page.links(&ctx.request, ctx.server, count)?;
                let mut document =
                    assemble_many(response.result.as_deref().unwrap_or(&[]), ctx.server)?;
                document.set_links(links);
                if let Some(meta) = response.meta {
                    if !meta.is_empty() {
                        document.set_meta(meta);
                    }
                }
                return Ok(Outcome::document(StatusCode::OK, document));
            }
        }

        if !self.capabilities.find_all {
            return Err(HttpError::new(
                format!(
                    "resource {} does not support listing its collection",
                    self.descriptor.name
                ),
                404,
            ));
        }
        let response = self.source.find_all(&ctx.request)?;
        let mut document = assemble_many(response.result.as_deref().unwrap_or(&[]), ctx.server)?;
        attach(&mut document, response.meta, response.links);
        Ok(Outcome::document(StatusCode::OK, document))
    }

    fn read(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let response = self.source.find_one(id, &ctx.request)?;
        self.respond(response, StatusCode::OK, ctx)
    }

    fn create(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let mut value = T::default();
        if self.capabilities.initializer {
            self.source.initialize(&mut value);
        }
        unmarshal_payload(ctx.body, &mut value, self.descriptor.name)?;

        let response = self.source.create(value, &ctx.request)?;
        let id = response
            .result
            .as_ref()
            .map(|created| created.id())
            .ok_or_else(|| {
                HttpError::new(
                    format!(
                        "expected one newly created value from resource {}",
                        self.descriptor.name
                    ),
                    500,
                )
            })?;
        let location = format!("{}/{}/{}", ctx.server.prefix_path(), self.descriptor.name, id);

        match response.status.as_u16() {
            201 => {
                let mut outcome = self.respond(response, StatusCode::CREATED, ctx)?;
                outcome.location = Some(location);
                Ok(outcome)
            }
            202 | 204 => Ok(Outcome {
                status: response.status,
                body: None,
                location: Some(location),
            }),
            _ => Err(self.invalid_status(response.status, "create")),
        }
    }

    fn update(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let mut value = self.fetch_existing(id, ctx)?;
        unmarshal_payload(ctx.body, &mut value, self.descriptor.name)?;

        let response = self.source.update(value, &ctx.request)?;
        match response.status.as_u16() {
            200 => {
                if response.result.is_some() {
                    return self.respond(response, StatusCode::OK, ctx);
                }
                // the source signalled "updated, fetch it yourself"
                let refreshed = self.source.find_one(id, &ctx.request)?;
                if refreshed.result.is_none() {
                    return Err(HttpError::new(
                        format!(
                            "expected find_one to return the updated value for resource {}",
                            self.descriptor.name
                        ),
                        500,
                    ));
                }
                self.respond(refreshed, StatusCode::OK, ctx)
            }
            202 | 204 => Ok(Outcome::empty(response.status)),
            _ => Err(self.invalid_status(response.status, "update")),
        }
    }

    fn delete(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let response = self.source.delete(id, &ctx.request)?;
        match response.status.as_u16() {
            200 => {
                let meta = response.meta.filter(|meta| !meta.is_empty()).ok_or_else(|| {
                    HttpError::new(
                        format!(
                            "delete on resource {} answered 200 without metadata",
                            self.descriptor.name
                        ),
                        500,
                    )
                })?;
                Ok(Outcome {
                    status: StatusCode::OK,
                    body: Some(ResponseBody::Meta(meta)),
                    location: None,
                })
            }
            202 | 204 => Ok(Outcome::empty(response.status)),
            _ => Err(self.invalid_status(response.status, "delete")),
        }
    }

    fn read_relationship(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let relation = self.require_relation(ctx)?;
        let response = self.source.find_one(id, &ctx.request)?;
        let meta = response.meta;

        let document = assemble_one(response.result.as_ref(), ctx.server)?;
        let mut relationship = {
            let node = document.node().ok_or_else(|| {
                HttpError::new(
                    format!("no value nor relationship {}", relation.name),
                    404,
                )
            })?;
            node.relationships
                .get(relation.name)
                .cloned()
                .ok_or_else(|| {
                    HttpError::new(
                        format!("there is no relationship named {}", relation.name),
                        404,
                    )
                })?
        };
        if let Some(meta) = meta {
            if !meta.is_empty() {
                relationship.meta = Some(meta);
            }
        }
        Ok(Outcome {
            status: StatusCode::OK,
            body: Some(ResponseBody::Relationship(relationship)),
            location: None,
        })
    }

    fn replace_relationship(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let relation = self.require_relation(ctx)?;
        let mut value = self.fetch_existing(id, ctx)?;
        let data = self.edit_payload(ctx)?;
        apply_relationship_data(&mut value, relation.name, &data)?;
        self.source.update(value, &ctx.request)?;
        Ok(Outcome::empty(StatusCode::NO_CONTENT))
    }

    fn add_to_many(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let relation = self.require_relation(ctx)?;
        let mut value = self.fetch_existing(id, ctx)?;
        let ids = self.to_many_edit_ids(ctx, relation)?;
        value
            .add_to_many_ids(relation.name, &ids)
            .map_err(contract_violation)?;
        self.source.update(value, &ctx.request)?;
        Ok(Outcome::empty(StatusCode::NO_CONTENT))
    }

    fn remove_to_many(&self, ctx: &RequestContext<'_>) -> Result<Outcome, HttpError> {
        let id = self.require_id(ctx)?;
        let relation = self.require_relation(ctx)?;
        let mut value = self.fetch_existing(id, ctx)?;
        let ids = self.to_many_edit_ids(ctx, relation)?;
        value
            .remove_to_many_ids(relation.name, &ids)
            .map_err(contract_violation)?;
        self.source.update(value, &ctx.request)?;
        Ok(Outcome::empty(StatusCode::NO_CONTENT))
    }
}

impl<T: Resource, S: DataSource<T>> Binding<T, S> {
    fn to_many_edit_ids(
        &self,
        ctx: &RequestContext<'_>,
        relation: &Relation,
    ) -> Result<Vec<String>, HttpError> {
        let data = self.edit_payload(ctx)?;
        let Value::Array(entries) = data else {
            return Err(HttpError::new(
                format!(
                    "the data member must be an array of objects with \"id\" and \"type\" members to edit relationship {}",
                    relation.name
                ),
                400,
            ));
        };
        collect_ids(&entries, relation.name)
    }
}
