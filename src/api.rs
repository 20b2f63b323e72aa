//! The top-level API value: registration, dispatch and response rendering.

use http::header::{ALLOW, CONTENT_TYPE, LOCATION};
use http::{HeaderValue, StatusCode};
use serde::Serialize;

use crate::document::MetaDocument;
use crate::error::{ConfigError, HttpError};
use crate::fields::{filter_document, sparse_fields};
use crate::handler::{Binding, Outcome, RequestContext, ResourceHandler, ResponseBody};
use crate::request::Request;
use crate::resource::Resource;
use crate::routes::{match_route, resource_routes, Action, Route};
use crate::source::DataSource;

/// The JSON:API media type, set on every response.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Where the API is mounted, used when building links and headers.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    base_url: String,
    prefix: String,
}

impl ServerInfo {
    pub(crate) fn new(prefix: &str, base_url: &str) -> Self {
        ServerInfo {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// The configured base URL without a trailing slash, possibly empty.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured path prefix without surrounding slashes, possibly empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The prefix as a path fragment: `"/v1"`, or `""` without a prefix.
    pub fn prefix_path(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("/{}", self.prefix)
        }
    }
}

/// A registry of bound resources and the routes they answer.
///
/// Built once at startup; concurrent requests may share it freely.
pub struct Api {
    server: ServerInfo,
    resources: Vec<Box<dyn ResourceHandler>>,
    routes: Vec<Route>,
}

impl Api {
    /// An API mounted under `prefix`, with relative links.
    pub fn new(prefix: &str) -> Self {
        Api::with_base_url(prefix, "")
    }

    /// An API mounted under `prefix` whose links start with `base_url`.
    pub fn with_base_url(prefix: &str, base_url: &str) -> Self {
        Api {
            server: ServerInfo::new(prefix, base_url),
            resources: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    /// The route table generated so far, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Bind a resource type to its data source and generate its routes.
    pub fn add_resource<T, S>(&mut self, source: S) -> Result<(), ConfigError>
    where
        T: Resource,
        S: DataSource<T>,
    {
        let binding = Binding::<T, S>::new(source)?;
        self.routes
            .extend(resource_routes(binding.descriptor(), binding.capabilities()));
        self.resources.push(Box::new(binding));
        Ok(())
    }

    /// Answer one transport request.
    ///
    /// Matches the path against the route table after stripping the prefix;
    /// anything unmatched gets a 404 envelope. Every response carries the
    /// JSON:API media type.
    pub fn handle(&self, req: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let matched = self
            .strip_prefix(&path)
            .and_then(|relative| match_route(&self.routes, &method, relative));
        let Some((route, id)) = matched else {
            tracing::debug!(%method, %path, "no route matched");
            return self.error_response(&HttpError::new(format!("no route for {method} {path}"), 404));
        };

        self.dispatch(route, id.as_deref(), req)
    }

    /// Run one matched route. Errors are logged with full detail and turned
    /// into a single error envelope.
    pub fn dispatch(
        &self,
        route: &Route,
        id: Option<&str>,
        req: http::Request<Vec<u8>>,
    ) -> http::Response<Vec<u8>> {
        match self.try_dispatch(route, id, req) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    status = err.status().as_u16(),
                    error = %err,
                    source = ?std::error::Error::source(&err),
                    resource = %route.resource,
                    "request failed"
                );
                self.error_response(&err)
            }
        }
    }

    fn try_dispatch(
        &self,
        route: &Route,
        id: Option<&str>,
        req: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, HttpError> {
        if route.action == Action::CollectionOptions {
            return Ok(self.options_response("GET,POST,PATCH,OPTIONS"));
        }
        if route.action == Action::ResourceOptions {
            return Ok(self.options_response("GET,PATCH,DELETE,OPTIONS"));
        }

        let handler = self.resource_by_name(&route.resource).ok_or_else(|| {
            HttpError::new(
                format!("no resource handler registered for {}", route.resource),
                404,
            )
        })?;
        let relation = match &route.relation {
            Some(name) => Some(handler.descriptor().relation(name).ok_or_else(|| {
                HttpError::new(format!("there is no relationship named {name}"), 404)
            })?),
            None => None,
        };

        let (parts, body) = req.into_parts();
        let mut request = Request::from_parts(parts);
        if route.action == Action::Related {
            // back-reference for the target's index protocol
            if let (Some(relation), Some(id)) = (relation, id) {
                request
                    .query_params
                    .insert(format!("{}ID", route.resource), vec![id.to_string()]);
                request
                    .query_params
                    .insert(format!("{}Name", route.resource), vec![relation.name.to_string()]);
            }
        }

        let ctx = RequestContext {
            request,
            body: &body,
            id: id.map(str::to_string),
            relation,
            server: &self.server,
        };

        let outcome = match route.action {
            Action::Index => handler.index(&ctx)?,
            Action::Read => handler.read(&ctx)?,
            Action::Create => handler.create(&ctx)?,
            Action::Update => handler.update(&ctx)?,
            Action::Delete => handler.delete(&ctx)?,
            Action::RelationshipRead => handler.read_relationship(&ctx)?,
            Action::RelationshipReplace => handler.replace_relationship(&ctx)?,
            Action::RelationshipAdd => handler.add_to_many(&ctx)?,
            Action::RelationshipRemove => handler.remove_to_many(&ctx)?,
            Action::Related => {
                let relation = ctx.relation.ok_or_else(|| {
                    HttpError::new("the matched route carries no relationship", 500)
                })?;
                let target = self.resource_by_name(relation.target).ok_or_else(|| {
                    HttpError::new(
                        format!(
                            "no resource handler is registered to handle the linked resource {}",
                            relation.name
                        ),
                        404,
                    )
                })?;
                target.index(&ctx)?
            }
            Action::CollectionOptions | Action::ResourceOptions => {
                return Err(HttpError::new("options answered before dispatch", 500))
            }
        };

        self.render(outcome, &ctx)
    }

    fn render(
        &self,
        outcome: Outcome,
        ctx: &RequestContext<'_>,
    ) -> Result<http::Response<Vec<u8>>, HttpError> {
        let Outcome {
            status,
            body,
            location,
        } = outcome;

        let bytes = match body {
            None => Vec::new(),
            Some(ResponseBody::Document(mut document)) => {
                let fields = sparse_fields(&ctx.request.query_params);
                if !fields.is_empty() {
                    filter_document(&mut document, &fields)?;
                }
                encode(&document)?
            }
            Some(ResponseBody::Relationship(relationship)) => encode(&relationship)?,
            Some(ResponseBody::Meta(meta)) => encode(&MetaDocument { meta })?,
        };

        let mut response = http::Response::new(bytes);
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        if let Some(location) = location {
            let value = HeaderValue::try_from(location)
                .map_err(|e| HttpError::new("cannot encode the location header", 500).with_source(e))?;
            response.headers_mut().insert(LOCATION, value);
        }
        Ok(response)
    }

    fn options_response(&self, allow: &'static str) -> http::Response<Vec<u8>> {
        let mut response = http::Response::new(Vec::new());
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static(allow));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        response
    }

    fn error_response(&self, err: &HttpError) -> http::Response<Vec<u8>> {
        let bytes = serde_json::to_vec(&err.document())
            .unwrap_or_else(|_| br#"{"errors":[]}"#.to_vec());
        let mut response = http::Response::new(bytes);
        *response.status_mut() = err.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        response
    }

    fn resource_by_name(&self, name: &str) -> Option<&dyn ResourceHandler> {
        self.resources
            .iter()
            .find(|resource| resource.descriptor().name == name)
            .map(|resource| &**resource)
    }

    fn strip_prefix<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.server.prefix.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(&format!("/{}", self.server.prefix))?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, HttpError> {
    serde_json::to_vec(value)
        .map_err(|e| HttpError::new("cannot encode the response document", 500).with_source(e))
}
