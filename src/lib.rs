//! jsonapi-bind
//!
//! Bind CRUD data sources to JSON:API routes and documents.
//!
//! A resource is a plain serde type plus a small shape declaration naming its
//! id field and relationships. Given that and a [`DataSource`], an [`Api`]
//! derives the full JSON:API route set, decodes request bodies, assembles
//! spec-shaped documents with relationship linkage and pagination links,
//! filters sparse fieldsets, and answers every request with one JSON:API
//! envelope. No HTTP server is prescribed; requests enter and leave as
//! `http::Request<Vec<u8>>` and `http::Response<Vec<u8>>`.
//!
//! | Action | Route |
//! |--------|-------|
//! | list, read | `GET /R`, `GET /R/:id` |
//! | write | `POST /R`, `PATCH /R/:id`, `DELETE /R/:id` |
//! | relationships | `GET`/`PATCH /R/:id/relationships/rel`, `GET /R/:id/rel` |
//! | to-many edits | `POST`/`DELETE /R/:id/relationships/rel` |
//!
//! # Example
//!
//! ```
//! use jsonapi_bind::{
//!     Api, Capabilities, DataSource, Field, HttpError, Request, Resource, ResourceError,
//!     Response,
//! };
//! use serde::{Deserialize, Serialize};
//! use std::sync::Mutex;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Article {
//!     id: String,
//!     title: String,
//! }
//!
//! impl Resource for Article {
//!     fn shape() -> &'static [Field] {
//!         static SHAPE: &[Field] = &[Field::primary("id", "articles")];
//!         SHAPE
//!     }
//!
//!     fn id(&self) -> String {
//!         self.id.clone()
//!     }
//!
//!     fn set_id(&mut self, id: &str) -> Result<(), ResourceError> {
//!         self.id = id.to_string();
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Articles {
//!     rows: Mutex<Vec<Article>>,
//! }
//!
//! impl DataSource<Article> for Articles {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::new().with_find_all()
//!     }
//!
//!     fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Article>, HttpError> {
//!         let rows = self.rows.lock().unwrap();
//!         rows.iter()
//!             .find(|article| article.id == id)
//!             .cloned()
//!             .map(Response::ok)
//!             .ok_or_else(|| HttpError::new(format!("article {id} not found"), 404))
//!     }
//!
//!     fn find_all(&self, _req: &Request) -> Result<Response<Vec<Article>>, HttpError> {
//!         Ok(Response::ok(self.rows.lock().unwrap().clone()))
//!     }
//!
//!     fn create(&self, article: Article, _req: &Request) -> Result<Response<Article>, HttpError> {
//!         self.rows.lock().unwrap().push(article.clone());
//!         Ok(Response::created(article))
//!     }
//!
//!     fn update(&self, article: Article, _req: &Request) -> Result<Response<Article>, HttpError> {
//!         let mut rows = self.rows.lock().unwrap();
//!         rows.retain(|existing| existing.id != article.id);
//!         rows.push(article.clone());
//!         Ok(Response::ok(article))
//!     }
//!
//!     fn delete(&self, id: &str, _req: &Request) -> Result<Response<Article>, HttpError> {
//!         self.rows.lock().unwrap().retain(|article| article.id != id);
//!         Ok(Response::no_content())
//!     }
//! }
//!
//! let mut api = Api::new("v1");
//! api.add_resource::<Article, _>(Articles::default()).unwrap();
//!
//! let request = http::Request::get("/v1/articles").body(Vec::new()).unwrap();
//! let response = api.handle(request);
//! assert_eq!(response.status(), 200);
//! ```

mod api;
mod descriptor;
mod document;
mod error;
mod fields;
mod handler;
mod node;
mod pagination;
mod relationships;
mod request;
mod resource;
mod routes;
mod source;

pub use api::{Api, ServerInfo, MEDIA_TYPE};
pub use descriptor::{Relation, ResourceDescriptor};
pub use document::{Document, ManyPayload, OnePayload};
pub use error::{ConfigError, ErrorDocument, ErrorObject, HttpError, ResourceError};
pub use fields::CODE_INVALID_QUERY_FIELDS;
pub use node::{Link, Linkage, Links, Meta, Node, Relationship, ResourceIdentifier};
pub use pagination::{page_bounds, PageBounds};
pub use request::Request;
pub use resource::{Field, FieldTag, Resource, ShapeFn};
pub use routes::{Action, Route};
pub use source::{Capabilities, DataSource, Response};
