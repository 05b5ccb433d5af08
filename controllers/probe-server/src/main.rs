//! ScyllaDB API Status Probe Server
//!
//! Runs next to a ScyllaDB node and answers its kubelet probes:
//! - `/readyz` - the node joined the cluster and serves CQL
//! - `/healthz` - the node's REST API answers
//!
//! Both honour await paths and the member Service's maintenance label.

mod config;
mod error;
mod prober;
mod server;


use std::sync::Arc;

use anyhow::Context;
use config::ProbeConfig;
use controller_helpers::telemetry::init_tracing;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use kube_runtime::reflector::{self, Store};
use kube_runtime::{WatchStreamExt, watcher};
use prober::Prober;
use scylla_client::LocalhostClientFactory;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting ScyllaDB API Status Probe Server");

    let config = ProbeConfig::from_env()?;

    info!("Configuration:");
    info!("  Service: {}/{}", config.namespace, config.service_name);
    info!("  Await paths: {:?}", config.await_paths);
    info!("  Listen address: {}", config.addr);
    info!("  Timeout: {:?}", config.timeout);
    info!("  ScyllaDB API port: {}", config.api_port);

    let kube_client = Client::try_default()
        .await
        .context("can't create Kubernetes client")?;

    let (services, services_task) = spawn_service_cache(kube_client, &config);
    services
        .wait_until_ready()
        .await
        .context("Service cache failed before its initial list completed")?;
    info!("Service cache synced");

    let prober = Prober::new(
        config.namespace.clone(),
        config.service_name.clone(),
        Arc::new(services),
        Arc::new(LocalhostClientFactory::new(config.api_port, config.timeout)),
        config.await_paths.clone(),
    )
    .with_timeout(config.timeout);

    let result = server::run_server(config.addr, Arc::new(prober), shutdown_signal()).await;
    services_task.abort();

    result.context("probe server failed")
}

/// Caches only the node's own member Service.
fn spawn_service_cache(client: Client, config: &ProbeConfig) -> (Store<Service>, JoinHandle<()>) {
    let api: Api<Service> = Api::namespaced(client, &config.namespace);
    let watch_config =
        watcher::Config::default().fields(&format!("metadata.name={}", config.service_name));

    let (store, writer) = reflector::store();
    let task = tokio::spawn(async move {
        let mut stream = reflector::reflector(writer, watcher(api, watch_config).default_backoff())
            .boxed();

        while let Some(event) = stream.next().await {
            if let Err(e) = event {
                warn!("Service cache watch error: {}", e);
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

    info!("Shutdown signal received");
}
