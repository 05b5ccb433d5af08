//! Readiness and liveness decisions for one ScyllaDB node.
//!
//! Both probes walk the same precondition chain and stop at the first step
//! that decides the outcome:
//!
//! 1. every await path exists (a missing path means the node is still
//!    provisioning: unready but alive),
//! 2. the node's member Service is not labelled for maintenance (unready but
//!    alive),
//! 3. the node's REST API answers (liveness) and the node has joined the
//!    cluster with the native transport enabled (readiness).
//!
//! Every outbound call of a request is bound by one deadline taken when the
//! request starts.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use controller_helpers::{AggregateError, LookupError, ObjectLister, aggregate};
use crds::naming::{NODE_MAINTENANCE_LABEL, manual_ref};
use k8s_openapi::api::core::v1::Service;
use scylla_client::{ScyllaClientFactory, ScyllaError};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, trace, warn};

use crate::error::ProbeError;

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Probe handlers bound to a single node.
pub struct Prober {
    namespace: String,
    service_name: String,
    services: Arc<dyn ObjectLister<Service>>,
    client_factory: Arc<dyn ScyllaClientFactory>,
    timeout: Duration,
    await_paths: Vec<PathBuf>,
}

impl Prober {
    pub fn new(
        namespace: String,
        service_name: String,
        services: Arc<dyn ObjectLister<Service>>,
        client_factory: Arc<dyn ScyllaClientFactory>,
        await_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            namespace,
            service_name,
            services,
            client_factory,
            timeout: DEFAULT_TIMEOUT,
            await_paths,
        }
    }

    /// Overrides the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn service_ref(&self) -> String {
        manual_ref(&self.namespace, &self.service_name)
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    /// Whether the member Service carries the maintenance label.
    pub fn is_node_under_maintenance(&self) -> Result<bool, LookupError> {
        let svc = self.services.get(&self.namespace, &self.service_name)?;

        Ok(svc
            .metadata
            .labels
            .as_ref()
            .is_some_and(|labels| labels.contains_key(NODE_MAINTENANCE_LABEL)))
    }

    /// Whether every await path exists.
    ///
    /// A path that doesn't exist only makes the result `false`; any other
    /// stat failure is collected and all of them are returned together.
    pub async fn await_paths_exist(
        &self,
        deadline: Instant,
    ) -> Result<bool, AggregateError<ProbeError>> {
        let mut errors = Vec::new();
        let mut ready = true;

        for path in &self.await_paths {
            match timeout_at(deadline, tokio::fs::metadata(path)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => ready = false,
                Ok(Err(source)) => errors.push(ProbeError::Stat {
                    path: path.clone(),
                    source,
                }),
                Err(_) => {
                    errors.push(ProbeError::DeadlineExceeded);
                    break;
                }
            }
        }

        aggregate(errors)?;

        Ok(ready)
    }

    /// Readiness: the node has joined the cluster and serves CQL.
    pub async fn readyz(&self) -> StatusCode {
        let deadline = self.deadline();

        match self.await_paths_exist(deadline).await {
            Err(e) => {
                error!("readyz probe: can't check required paths' existence: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            Ok(false) => {
                debug!(
                    "readyz probe: node is awaiting required paths' existence: {:?}",
                    self.await_paths
                );
                return StatusCode::SERVICE_UNAVAILABLE;
            }
            Ok(true) => {}
        }

        match self.is_node_under_maintenance() {
            Err(e) => {
                warn!(
                    "readyz probe: can't look up service maintenance label of {}: {}",
                    self.service_ref(),
                    e
                );
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            Ok(true) => {
                // A node under maintenance must not receive traffic.
                debug!("readyz probe: node {} is under maintenance", self.service_ref());
                return StatusCode::SERVICE_UNAVAILABLE;
            }
            Ok(false) => {}
        }

        let client = match self.client_factory.local_client() {
            Ok(client) => client,
            Err(e) => {
                error!("readyz probe: can't get scylla client for {}: {}", self.service_ref(), e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        };

        let node_statuses = match bounded(deadline, client.status()).await {
            Ok(statuses) => statuses,
            Err(e) => {
                error!("readyz probe: can't get scylla node status for {}: {}", self.service_ref(), e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        };

        let host_id = match bounded(deadline, client.local_host_id(false)).await {
            Ok(host_id) => host_id,
            Err(e) => {
                error!("readyz probe: can't get host id of {}: {}", self.service_ref(), e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        };

        for status in &node_statuses {
            trace!(
                "readyz probe: node {} is {}{}",
                status.addr, status.status, status.state
            );

            if status.host_id != host_id || !status.is_un() {
                continue;
            }

            match bounded(deadline, client.is_native_transport_enabled()).await {
                Ok(true) => return StatusCode::OK,
                Ok(false) => {
                    trace!("readyz probe: node {} has native transport disabled", status.addr);
                }
                Err(e) => {
                    error!(
                        "readyz probe: can't get scylla native transport of node {} ({}): {}",
                        status.addr,
                        self.service_ref(),
                        e
                    );
                    return StatusCode::SERVICE_UNAVAILABLE;
                }
            }
        }

        debug!("readyz probe: node {} is not ready", self.service_ref());
        StatusCode::SERVICE_UNAVAILABLE
    }

    /// Liveness: the node's REST API answers.
    pub async fn healthz(&self) -> StatusCode {
        let deadline = self.deadline();

        match self.await_paths_exist(deadline).await {
            Err(e) => {
                error!("healthz probe: can't check required paths' existence: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            Ok(false) => {
                debug!(
                    "healthz probe: node is awaiting required paths' existence: {:?}",
                    self.await_paths
                );
                return StatusCode::OK;
            }
            Ok(true) => {}
        }

        match self.is_node_under_maintenance() {
            Err(e) => {
                warn!(
                    "healthz probe: can't look up service maintenance label of {}: {}",
                    self.service_ref(),
                    e
                );
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
            Ok(true) => {
                debug!("healthz probe: node {} is under maintenance", self.service_ref());
                return StatusCode::OK;
            }
            Ok(false) => {}
        }

        let client = match self.client_factory.local_client() {
            Ok(client) => client,
            Err(e) => {
                error!("healthz probe: can't get scylla client for {}: {}", self.service_ref(), e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        };

        if let Err(e) = bounded(deadline, client.ping()).await {
            error!("healthz probe: can't connect to Scylla API of {}: {}", self.service_ref(), e);
            return StatusCode::SERVICE_UNAVAILABLE;
        }

        StatusCode::OK
    }
}

/// Runs `fut` until `deadline`, reporting a late answer as an error.
async fn bounded<T, F>(deadline: Instant, fut: F) -> Result<T, ScyllaError>
where
    F: Future<Output = Result<T, ScyllaError>>,
{
    timeout_at(deadline, fut)
        .await
        .unwrap_or(Err(ScyllaError::DeadlineExceeded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_reports_deadline() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let result = bounded(deadline, std::future::pending::<Result<(), ScyllaError>>()).await;
        assert!(matches!(result, Err(ScyllaError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let result = bounded(deadline, async { Ok::<_, ScyllaError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
