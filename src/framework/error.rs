//! # Framework Errors
//!
//! This module defines the error types used throughout the resource engine.
//! Each concern gets its own enum (codec, transport) and [`ResourceError`]
//! wraps them for the caller-facing API, so a single `?` works everywhere.

use crate::framework::rules::Direction;
use crate::framework::transport::TransportError;

/// Errors raised while converting between wire and internal representations.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CodecError {
    /// A registered path rule returned an error.
    #[error("{direction} rule for '{path}' failed: {reason}")]
    Transform {
        path: String,
        direction: Direction,
        reason: String,
    },

    /// Decode was handed something other than a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// Errors surfaced by resource operations and model definitions.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A hook callback failed; the rest of that lifecycle step was skipped.
    #[error("hook for '{event}' failed: {reason}")]
    Hook { event: String, reason: String },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("config error: {source}")]
    Config {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// The task running an operation's after phase panicked or was shut down.
    #[error("operation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("model already defined: {0}")]
    DuplicateModel(String),
}

impl ResourceError {
    /// The transport failure behind this error, if that is what it is.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ResourceError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
