//! Error types for the auto workflow.
//!
//! [`WorkflowError`] covers every failure a single step can produce: input
//! validation, transport, response decoding, remote state, and local file I/O.
//! The orchestrator wraps it in a `WorkflowFailure` together with the step it
//! failed at and the cleanup actions taken afterwards.

use std::time::Duration;

use acuctl_core::types::ResourceKind;

/// Error raised by the resource client, poller, downloader, or orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Required input was missing or malformed; no remote call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport-level failure (connection refused, TLS, timeout, ...).
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Request URL
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The service answered a create or download call with a non-2xx status.
    #[error("{operation} rejected with status {status}: {body}")]
    Rejected {
        /// Operation name, e.g. `create scan`
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode {kind} response: {reason}")]
    Decode {
        /// Resource kind the response belongs to
        kind: ResourceKind,
        /// Parser error
        reason: String,
    },

    /// The decoded body lacks the expected id or status field.
    #[error("{kind} response is missing field '{field}'")]
    MissingField {
        /// Resource kind the response belongs to
        kind: ResourceKind,
        /// JSON field path
        field: &'static str,
    },

    /// An existence check or status read returned a non-success status.
    #[error("{kind} '{id}' does not exist (status {status})")]
    NotFound {
        /// Resource kind
        kind: ResourceKind,
        /// Resource id
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// The poll deadline passed before the resource reached a terminal state.
    #[error("timed out after {timeout:?} waiting for {kind} '{id}'")]
    TimedOut {
        /// Resource kind
        kind: ResourceKind,
        /// Resource id
        id: String,
        /// Configured wait timeout
        timeout: Duration,
    },

    /// The resource reported a failure status (`failed`, `aborted`).
    #[error("{kind} '{id}' finished with status '{status}'")]
    RemoteFailed {
        /// Resource kind
        kind: ResourceKind,
        /// Resource id
        id: String,
        /// Terminal status reported by the service
        status: String,
    },

    /// A cleanup deletion returned a non-2xx status.
    #[error("failed to delete {kind} '{id}' (status {status})")]
    Delete {
        /// Resource kind
        kind: ResourceKind,
        /// Resource id
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// Writing a downloaded file failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Local path being written
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl WorkflowError {
    /// Build a [`WorkflowError::Request`] from a `reqwest` error.
    pub(crate) fn request(url: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    /// Build a [`WorkflowError::Io`] for a local path.
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether this is a delete that failed because the resource is already gone.
    pub fn is_already_deleted(&self) -> bool {
        matches!(self, Self::Delete { status: 404, .. })
    }
}
