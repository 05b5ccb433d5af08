//! Mock ScyllaClient for unit testing
//!
//! This module provides mock implementations of the client traits that can be
//! used in unit tests without a running ScyllaDB node.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ScyllaError;
use crate::models::NodeStatusInfo;
use crate::scylla_trait::{ScyllaClientFactory, ScyllaClientTrait};

struct MockState {
    ping: Result<Duration, String>,
    statuses: Result<Vec<NodeStatusInfo>, String>,
    host_id: Result<String, String>,
    native_transport: Result<bool, String>,
    hang: bool,
    calls: Vec<&'static str>,
}

/// Mock ScyllaClient for testing
///
/// Every operation answers from canned values that tests can reconfigure.
/// Errors are stored as messages and surfaced as [`ScyllaError::Api`].
#[derive(Clone)]
pub struct MockScyllaClient {
    base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockScyllaClient {
    /// Create a new mock client that answers every call successfully
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Arc::new(Mutex::new(MockState {
                ping: Ok(Duration::from_millis(1)),
                statuses: Ok(Vec::new()),
                host_id: Ok(String::new()),
                native_transport: Ok(true),
                hang: false,
                calls: Vec::new(),
            })),
        }
    }

    pub fn set_ping_error(&self, message: impl Into<String>) {
        self.state.lock().unwrap().ping = Err(message.into());
    }

    pub fn set_statuses(&self, statuses: Vec<NodeStatusInfo>) {
        self.state.lock().unwrap().statuses = Ok(statuses);
    }

    pub fn set_statuses_error(&self, message: impl Into<String>) {
        self.state.lock().unwrap().statuses = Err(message.into());
    }

    pub fn set_host_id(&self, host_id: impl Into<String>) {
        self.state.lock().unwrap().host_id = Ok(host_id.into());
    }

    pub fn set_host_id_error(&self, message: impl Into<String>) {
        self.state.lock().unwrap().host_id = Err(message.into());
    }

    pub fn set_native_transport(&self, enabled: bool) {
        self.state.lock().unwrap().native_transport = Ok(enabled);
    }

    pub fn set_native_transport_error(&self, message: impl Into<String>) {
        self.state.lock().unwrap().native_transport = Err(message.into());
    }

    /// Make every subsequent call wait forever instead of answering
    pub fn set_hang(&self) {
        self.state.lock().unwrap().hang = true;
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    async fn record(&self, call: &'static str) {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            state.hang
        };

        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait::async_trait]
impl ScyllaClientTrait for MockScyllaClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ping(&self) -> Result<Duration, ScyllaError> {
        self.record("ping").await;
        self.state.lock().unwrap().ping.clone().map_err(ScyllaError::Api)
    }

    async fn status(&self) -> Result<Vec<NodeStatusInfo>, ScyllaError> {
        self.record("status").await;
        self.state
            .lock()
            .unwrap()
            .statuses
            .clone()
            .map_err(ScyllaError::Api)
    }

    async fn local_host_id(&self, _use_hosts_file: bool) -> Result<String, ScyllaError> {
        self.record("local_host_id").await;
        self.state
            .lock()
            .unwrap()
            .host_id
            .clone()
            .map_err(ScyllaError::Api)
    }

    async fn is_native_transport_enabled(&self) -> Result<bool, ScyllaError> {
        self.record("is_native_transport_enabled").await;
        self.state
            .lock()
            .unwrap()
            .native_transport
            .clone()
            .map_err(ScyllaError::Api)
    }
}

/// Client handed out by [`MockScyllaClientFactory`]; counts its own release.
struct TrackedClient {
    inner: MockScyllaClient,
    released: Arc<AtomicUsize>,
}

impl Drop for TrackedClient {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ScyllaClientTrait for TrackedClient {
    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn ping(&self) -> Result<Duration, ScyllaError> {
        self.inner.ping().await
    }

    async fn status(&self) -> Result<Vec<NodeStatusInfo>, ScyllaError> {
        self.inner.status().await
    }

    async fn local_host_id(&self, use_hosts_file: bool) -> Result<String, ScyllaError> {
        self.inner.local_host_id(use_hosts_file).await
    }

    async fn is_native_transport_enabled(&self) -> Result<bool, ScyllaError> {
        self.inner.is_native_transport_enabled().await
    }
}

/// Factory handing out [`MockScyllaClient`]s and tracking their lifetime
#[derive(Clone)]
pub struct MockScyllaClientFactory {
    client: MockScyllaClient,
    construction_error: Arc<Mutex<Option<String>>>,
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockScyllaClientFactory {
    pub fn new(client: MockScyllaClient) -> Self {
        Self {
            client,
            construction_error: Arc::new(Mutex::new(None)),
            created: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every subsequent `local_client` call fail
    pub fn fail_construction(&self, message: impl Into<String>) {
        *self.construction_error.lock().unwrap() = Some(message.into());
    }

    pub fn client(&self) -> &MockScyllaClient {
        &self.client
    }

    /// Number of clients handed out
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of handed out clients that have been dropped
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ScyllaClientFactory for MockScyllaClientFactory {
    fn local_client(&self) -> Result<Box<dyn ScyllaClientTrait>, ScyllaError> {
        if let Some(message) = self.construction_error.lock().unwrap().clone() {
            return Err(ScyllaError::InvalidRequest(message));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedClient {
            inner: self.client.clone(),
            released: Arc::clone(&self.released),
        }))
    }
}
