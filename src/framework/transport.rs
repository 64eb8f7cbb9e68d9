//! # Transport
//!
//! The seam between the engine and whatever actually moves bytes. The engine
//! issues exactly one [`Request`] per operation and awaits the returned future.
//!
//! A transport reports failure in two ways:
//! - returning `Err` from [`Transport::request`] means the request could not
//!   even be issued (malformed, unexpected);
//! - resolving the future with `Err` means the remote side answered with a
//!   non-success status or the connection failed.
//!
//! The executor treats both the same way: it runs the failure branch.

use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Response {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Splits responses into the success and failure arms by status.
    pub fn into_result(self) -> Result<Response, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TransportError {
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("unexpected request: {method} {url}")]
    Unexpected { method: Method, url: String },

    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    /// Status code of a rejected response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The single suspension point of an operation.
pub type TransportFuture = LocalBoxFuture<'static, Result<Response, TransportError>>;

/// Issues requests on behalf of the engine.
pub trait Transport {
    fn request(&self, request: Request) -> Result<TransportFuture, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_statuses() {
        assert!(Response::new(204, json!(null)).into_result().is_ok());

        let err = Response::new(404, json!({ "error": "missing" }))
            .into_result()
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn methods_render_uppercase() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(serde_json::to_value(Method::Delete).unwrap(), json!("DELETE"));
    }
}
