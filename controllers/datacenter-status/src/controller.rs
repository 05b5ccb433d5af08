//! Main controller implementation.
//!
//! Wires the object caches, the reconciler and the datacenter watcher
//! together for the datacenter status controller.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crds::ScyllaDBDatacenter;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{Api, Client, Resource};
use kube_runtime::reflector::{self, Store};
use kube_runtime::{WatchStreamExt, watcher};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::status_writer::KubeStatusWriter;
use crate::watcher::Watcher;

/// Main controller for ScyllaDBDatacenter status.
pub struct Controller {
    datacenter_watcher: JoinHandle<Result<(), ControllerError>>,
    cache_tasks: Vec<JoinHandle<()>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    ///
    /// Returns once every object cache has completed its initial list.
    pub async fn new(namespace: String, resync_interval: Duration) -> Result<Self, ControllerError> {
        info!("Initializing ScyllaDBDatacenter status controller");

        let kube_client = Client::try_default().await?;

        let (pods, pods_task) = spawn_cache::<Pod>(Api::namespaced(kube_client.clone(), &namespace));
        let (stateful_sets, stateful_sets_task) =
            spawn_cache::<StatefulSet>(Api::namespaced(kube_client.clone(), &namespace));
        let (services, services_task) =
            spawn_cache::<Service>(Api::namespaced(kube_client.clone(), &namespace));

        for (kind, ready) in [
            ("Pod", pods.wait_until_ready().await),
            ("StatefulSet", stateful_sets.wait_until_ready().await),
            ("Service", services.wait_until_ready().await),
        ] {
            ready.map_err(|e| ControllerError::Watch(format!("{} cache failed: {}", kind, e)))?;
        }
        info!("Object caches synced");

        let reconciler = Arc::new(Reconciler::new(
            Arc::new(pods),
            Arc::new(stateful_sets),
            Arc::new(services),
            Arc::new(KubeStatusWriter::new(kube_client.clone())),
        ));

        let datacenter_api: Api<ScyllaDBDatacenter> = Api::namespaced(kube_client, &namespace);
        let watcher_instance = Watcher::new(reconciler, datacenter_api, resync_interval);

        let datacenter_watcher =
            tokio::spawn(async move { watcher_instance.watch_datacenters().await });

        Ok(Self {
            datacenter_watcher,
            cache_tasks: vec![pods_task, stateful_sets_task, services_task],
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("ScyllaDBDatacenter status controller running");

        let result = tokio::select! {
            result = self.datacenter_watcher => {
                result
                    .map_err(|e| ControllerError::Watch(format!("ScyllaDBDatacenter watcher panicked: {}", e)))
                    .and_then(|r| r)
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        for task in &self.cache_tasks {
            task.abort();
        }

        result
    }
}

/// Starts a reflector for `api` and returns its reader.
fn spawn_cache<K>(api: Api<K>) -> (Store<K>, JoinHandle<()>)
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (store, writer) = reflector::store();
    let task = tokio::spawn(async move {
        let mut stream = reflector::reflector(
            writer,
            watcher(api, watcher::Config::default()).default_backoff(),
        )
        .boxed();

        while let Some(event) = stream.next().await {
            if let Err(e) = event {
                warn!("{} cache watch error: {}", K::kind(&()), e);
            }
        }
    });

    (store, task)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
