//! ScyllaDB REST API client
//!
//! Talks to the administrative REST API every ScyllaDB process exposes
//! (port 10000 by default). The API only listens inside the pod, so clients
//! are always bound to the local node.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ScyllaError;
use crate::models::{HostIdMapping, NodeState, NodeStatus, NodeStatusInfo};
use crate::scylla_trait::{ScyllaClientFactory, ScyllaClientTrait};

/// Default port of the ScyllaDB REST API
pub const DEFAULT_API_PORT: u16 = 10000;

const LOCALHOST: &str = "localhost";

/// ScyllaDB REST API client
pub struct ScyllaClient {
    client: Client,
    base_url: String,
}

impl ScyllaClient {
    /// Create a new ScyllaDB client
    ///
    /// # Arguments
    /// * `base_url` - REST API base URL (e.g., "http://localhost:10000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ScyllaError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ScyllaError::InvalidRequest(format!(
                "base URL must be http(s): {}",
                base_url
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for the REST API of the node running in this pod
    pub fn for_localhost(port: u16, timeout: Duration) -> Result<Self, ScyllaError> {
        Self::new(format!("http://{}:{}", LOCALHOST, port), timeout)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and decode the JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ScyllaError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScyllaError::Api(format!(
                "GET {} failed: {} - {}",
                path, status, body
            )));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Ping the node by reading its uptime
    pub async fn ping(&self) -> Result<Duration, ScyllaError> {
        let started = Instant::now();
        let _uptime_ms: u64 = self.get("/system/uptime_ms").await?;
        Ok(started.elapsed())
    }

    /// Get the status of all cluster members as seen by this node
    ///
    /// Combines the endpoint to host ID mapping with the gossiper's live set
    /// and the storage service's joining/leaving/moving sets.
    pub async fn status(&self) -> Result<Vec<NodeStatusInfo>, ScyllaError> {
        let (host_ids, live, joining, leaving, moving) = tokio::try_join!(
            self.get::<Vec<HostIdMapping>>("/storage_service/host_id"),
            self.get::<Vec<String>>("/gossiper/endpoint/live"),
            self.get::<Vec<String>>("/storage_service/nodes/joining"),
            self.get::<Vec<String>>("/storage_service/nodes/leaving"),
            self.get::<Vec<String>>("/storage_service/nodes/moving"),
        )?;

        let live: HashSet<String> = live.into_iter().collect();
        let joining: HashSet<String> = joining.into_iter().collect();
        let leaving: HashSet<String> = leaving.into_iter().collect();
        let moving: HashSet<String> = moving.into_iter().collect();

        let statuses = host_ids
            .into_iter()
            .map(|mapping| {
                let status = if live.contains(&mapping.key) {
                    NodeStatus::Up
                } else {
                    NodeStatus::Down
                };

                let state = if joining.contains(&mapping.key) {
                    NodeState::Joining
                } else if leaving.contains(&mapping.key) {
                    NodeState::Leaving
                } else if moving.contains(&mapping.key) {
                    NodeState::Moving
                } else {
                    NodeState::Normal
                };

                NodeStatusInfo {
                    addr: mapping.key,
                    host_id: mapping.value,
                    status,
                    state,
                }
            })
            .collect();

        Ok(statuses)
    }

    /// Get the host ID of this node
    pub async fn local_host_id(&self, use_hosts_file: bool) -> Result<String, ScyllaError> {
        let host_id: String = self.get("/storage_service/hostid/local").await?;

        if use_hosts_file {
            let mappings: Vec<HostIdMapping> = self.get("/storage_service/host_id").await?;
            if !mappings.iter().any(|m| m.value == host_id) {
                return Err(ScyllaError::HostIdNotFound(host_id));
            }
        }

        Ok(host_id)
    }

    /// Check whether the CQL native transport is running
    pub async fn is_native_transport_enabled(&self) -> Result<bool, ScyllaError> {
        self.get("/storage_service/native_transport").await
    }
}

#[async_trait::async_trait]
impl ScyllaClientTrait for ScyllaClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn ping(&self) -> Result<Duration, ScyllaError> {
        self.ping().await
    }

    async fn status(&self) -> Result<Vec<NodeStatusInfo>, ScyllaError> {
        self.status().await
    }

    async fn local_host_id(&self, use_hosts_file: bool) -> Result<String, ScyllaError> {
        self.local_host_id(use_hosts_file).await
    }

    async fn is_native_transport_enabled(&self) -> Result<bool, ScyllaError> {
        self.is_native_transport_enabled().await
    }
}

/// Builds [`ScyllaClient`]s for the node running in this pod.
#[derive(Debug, Clone)]
pub struct LocalhostClientFactory {
    port: u16,
    timeout: Duration,
}

impl LocalhostClientFactory {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl ScyllaClientFactory for LocalhostClientFactory {
    fn local_client(&self) -> Result<Box<dyn ScyllaClientTrait>, ScyllaError> {
        Ok(Box::new(ScyllaClient::for_localhost(self.port, self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ScyllaClient::new("http://localhost:10000/".to_string(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:10000");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let result = ScyllaClient::new("localhost:10000".to_string(), Duration::from_secs(1));
        assert!(matches!(result, Err(ScyllaError::InvalidRequest(_))));
    }

    #[test]
    fn test_factory_targets_localhost() {
        let factory = LocalhostClientFactory::new(DEFAULT_API_PORT, Duration::from_secs(1));
        let client = factory.local_client().unwrap();
        assert_eq!(client.base_url(), "http://localhost:10000");
    }
}
