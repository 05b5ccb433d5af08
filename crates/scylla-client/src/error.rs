//! ScyllaDB client errors

use thiserror::Error;

/// Errors that can occur when talking to the ScyllaDB REST API
#[derive(Debug, Error)]
pub enum ScyllaError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ScyllaDB API returned a non-success status
    #[error("ScyllaDB API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The local host ID is not part of the node's host ID mapping
    #[error("host ID {0} not found in host ID mapping")]
    HostIdNotFound(String),

    /// The caller's deadline elapsed before the API answered
    #[error("deadline exceeded waiting for ScyllaDB API")]
    DeadlineExceeded,

    /// Invalid request (e.g., malformed base URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
