//! ScyllaDBDatacenter Status Controller
//!
//! Keeps the status of every ScyllaDBDatacenter in the watched namespace in
//! sync with the observed state of its racks:
//! - per-rack node counts, versions and staleness from the rack StatefulSets
//! - datacenter-wide aggregated counts
//! - the `Prewarmed` condition from member Services and their pods
//!
//! Status is written only when it changed.

mod controller;
mod error;
mod reconciler;
mod status;
mod status_writer;
mod watcher;

#[cfg(test)]
mod test_utils;

use std::env;
use std::time::Duration;

use controller::Controller;
use controller_helpers::telemetry::init_tracing;
use tracing::info;

use crate::error::ControllerError;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_RESYNC_INTERVAL_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    init_tracing();

    info!("Starting ScyllaDBDatacenter Status Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
    let resync_interval = match env::var("RESYNC_INTERVAL_SECONDS") {
        Ok(value) => value.parse::<u64>().map_err(|e| {
            ControllerError::InvalidConfig(format!(
                "RESYNC_INTERVAL_SECONDS must be a number of seconds, got {:?}: {}",
                value, e
            ))
        })?,
        Err(_) => DEFAULT_RESYNC_INTERVAL_SECONDS,
    };

    if resync_interval == 0 {
        return Err(ControllerError::InvalidConfig(
            "RESYNC_INTERVAL_SECONDS must be greater than zero".to_string(),
        ));
    }

    info!("Configuration:");
    info!("  Namespace: {}", namespace);
    info!("  Resync interval: {}s", resync_interval);

    // Initialize and run controller
    let controller = Controller::new(namespace, Duration::from_secs(resync_interval)).await?;
    controller.run().await?;

    Ok(())
}
