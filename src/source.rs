//! Data source capabilities and the responder value they return.

use http::StatusCode;

use crate::error::HttpError;
use crate::node::{Links, Meta};
use crate::request::Request;
use crate::resource::Resource;

/// The optional behaviors a source declares at registration.
///
/// Routing and dispatch consult these flags; nothing probes the source per
/// request. A flag without a matching implementation surfaces as a contract
/// violation when the route is hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The source answers plain collection listing.
    pub find_all: bool,
    /// The source answers paginated collection listing with a total count.
    pub paginated_find_all: bool,
    /// The source adjusts fresh values before create bodies decode onto them.
    pub initializer: bool,
    /// The resource accepts to-many relationship add and remove edits.
    pub to_many_editing: bool,
}

impl Capabilities {
    pub const fn new() -> Self {
        Capabilities {
            find_all: false,
            paginated_find_all: false,
            initializer: false,
            to_many_editing: false,
        }
    }

    pub const fn with_find_all(mut self) -> Self {
        self.find_all = true;
        self
    }

    pub const fn with_paginated_find_all(mut self) -> Self {
        self.paginated_find_all = true;
        self
    }

    pub const fn with_initializer(mut self) -> Self {
        self.initializer = true;
        self
    }

    pub const fn with_to_many_editing(mut self) -> Self {
        self.to_many_editing = true;
        self
    }
}

/// What a capability call answers: an optional result, a status code, and
/// optional metadata and links for the assembled document.
#[derive(Debug, Clone)]
pub struct Response<R> {
    pub result: Option<R>,
    pub status: StatusCode,
    pub meta: Option<Meta>,
    pub links: Option<Links>,
}

impl<R> Response<R> {
    pub fn new(result: Option<R>, status: StatusCode) -> Self {
        Response {
            result,
            status,
            meta: None,
            links: None,
        }
    }

    /// A 200 response carrying a result.
    pub fn ok(result: R) -> Self {
        Response::new(Some(result), StatusCode::OK)
    }

    /// A 201 response carrying the created result.
    pub fn created(result: R) -> Self {
        Response::new(Some(result), StatusCode::CREATED)
    }

    /// An empty 202 response.
    pub fn accepted() -> Self {
        Response::new(None, StatusCode::ACCEPTED)
    }

    /// An empty 204 response.
    pub fn no_content() -> Self {
        Response::new(None, StatusCode::NO_CONTENT)
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }
}

/// The capability set a resource binds to.
///
/// The four mandatory operations must be implemented; the rest are optional
/// and only routed to when [`DataSource::capabilities`] declares them. Errors
/// pass through to the client with the status and title they carry, after
/// being logged server-side with full detail.
pub trait DataSource<T: Resource>: Send + Sync + 'static {
    fn find_one(&self, id: &str, req: &Request) -> Result<Response<T>, HttpError>;

    fn create(&self, value: T, req: &Request) -> Result<Response<T>, HttpError>;

    fn update(&self, value: T, req: &Request) -> Result<Response<T>, HttpError>;

    fn delete(&self, id: &str, req: &Request) -> Result<Response<T>, HttpError>;

    /// The optional behaviors this source supports. Read once at registration.
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
    }

    /// List the whole collection.
    fn find_all(&self, _req: &Request) -> Result<Response<Vec<T>>, HttpError> {
        Err(HttpError::new(
            "collection listing is declared but not implemented by this source",
            500,
        ))
    }

    /// List one page of the collection and report the total entry count.
    fn paginated_find_all(&self, _req: &Request) -> Result<(u64, Response<Vec<T>>), HttpError> {
        Err(HttpError::new(
            "paginated listing is declared but not implemented by this source",
            500,
        ))
    }

    /// Adjust a fresh value before the create body decodes onto it.
    fn initialize(&self, _value: &mut T) {}
}
