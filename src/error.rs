//! Error types for resource binding and JSON:API error envelopes.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while registering a resource.
///
/// These indicate a broken resource declaration and surface at startup,
/// never during request handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("resource type {type_name} declares no primary field tag")]
    MissingPrimary { type_name: String },

    #[error("relationship {relation} of {type_name} points at a shape with no primary field tag")]
    MissingRelationPrimary { type_name: String, relation: String },
}

/// Errors a resource value reports from its identity and relationship seams.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("the resource does not accept a to-one reference for {name}")]
    UnsupportedToOne { name: String },

    #[error("the resource does not accept to-many references for {name}")]
    UnsupportedToMany { name: String },

    #[error("the to-many relationship {name} cannot be edited")]
    UnsupportedToManyEdit { name: String },

    #[error("the resource has no relationship named {name}")]
    UnknownRelationship { name: String },

    #[error("invalid id value {value:?}")]
    InvalidId { value: String },
}

/// A single member of a JSON:API error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub title: String,
    /// HTTP status, carried as a string on the wire.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// The top-level JSON:API error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

/// A terminal request error.
///
/// Carries a public title and status, an optional list of explicit error
/// objects, and an optional source error. The source is logged server-side
/// and never serialized into the envelope.
#[derive(Debug)]
pub struct HttpError {
    title: String,
    status: StatusCode,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    errors: Vec<ErrorObject>,
}

impl HttpError {
    /// Create an error with a public title and an HTTP status code.
    ///
    /// Unknown status codes fall back to 500.
    pub fn new(title: impl Into<String>, status: u16) -> Self {
        HttpError {
            title: title.into(),
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            source: None,
            errors: Vec::new(),
        }
    }

    /// Create an error whose title is the canonical reason phrase of the status.
    pub fn from_status(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpError {
            title: status.canonical_reason().unwrap_or("unknown status").to_string(),
            status,
            source: None,
            errors: Vec::new(),
        }
    }

    /// Attach the underlying error for server-side logging.
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Replace the explicit error-object list.
    pub fn with_errors(mut self, errors: Vec<ErrorObject>) -> Self {
        self.errors = errors;
        self
    }

    /// Append one explicit error object.
    pub fn push_error(&mut self, error: ErrorObject) {
        self.errors.push(error);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The envelope to serialize for this error.
    ///
    /// When no explicit error objects were attached, a single object is
    /// synthesized from the title and status.
    pub fn document(&self) -> ErrorDocument {
        let errors = if self.errors.is_empty() {
            vec![ErrorObject {
                title: self.title.clone(),
                status: self.status.as_str().to_string(),
                code: None,
                detail: None,
            }]
        } else {
            self.errors.clone()
        };
        ErrorDocument { errors }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "http error ({}) {}", self.status.as_u16(), self.title)?;
        if !self.errors.is_empty() {
            write!(f, " and {} more errors", self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
