//! ScyllaClient traits for mocking
//!
//! These traits abstract the ScyllaDB REST API client so the probe can be
//! unit tested. The concrete ScyllaClient implements them, and tests can use
//! the mock implementations from the `test-util` feature.

use std::time::Duration;

use crate::error::ScyllaError;
use crate::models::NodeStatusInfo;

/// Operations of the ScyllaDB REST API used by health checks.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// A client is bound to a single node; it never routes requests to peers.
#[async_trait::async_trait]
pub trait ScyllaClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Lightweight liveness check, returns the round trip time
    async fn ping(&self) -> Result<Duration, ScyllaError>;

    /// Status of every cluster member as seen by this node
    async fn status(&self) -> Result<Vec<NodeStatusInfo>, ScyllaError>;

    /// Host ID of this node
    ///
    /// With `use_hosts_file` the ID is additionally confirmed against the
    /// node's endpoint to host ID mapping.
    async fn local_host_id(&self, use_hosts_file: bool) -> Result<String, ScyllaError>;

    /// Whether the CQL native transport is enabled on this node
    async fn is_native_transport_enabled(&self) -> Result<bool, ScyllaError>;
}

/// Creates clients scoped to the local node.
///
/// A fresh client is created for every probe invocation; dropping it releases
/// its connections.
pub trait ScyllaClientFactory: Send + Sync {
    fn local_client(&self) -> Result<Box<dyn ScyllaClientTrait>, ScyllaError>;
}
