//! Kubernetes resource watchers.
//!
//! Watch events and periodic resyncs are consumed by a single loop, so at
//! most one status pass runs at any time.

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use crds::ScyllaDBDatacenter;
use crds::naming::obj_ref;
use futures::TryStreamExt;
use kube::Api;
use kube_runtime::reflector::{self, Store};
use kube_runtime::{WatchStreamExt, watcher};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::ControllerError;
use crate::reconciler::Reconciler;

/// Watches ScyllaDBDatacenter resources and triggers status passes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    api: Api<ScyllaDBDatacenter>,
    resync_interval: Duration,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        api: Api<ScyllaDBDatacenter>,
        resync_interval: Duration,
    ) -> Self {
        Self {
            reconciler,
            api,
            resync_interval,
        }
    }

    /// Watches datacenters until the watch stream ends.
    ///
    /// Every applied datacenter gets a pass; on each resync tick every
    /// cached datacenter gets one, which picks up changes to owned objects.
    pub async fn watch_datacenters(&self) -> Result<(), ControllerError> {
        info!("Starting ScyllaDBDatacenter watcher");

        let (store, writer) = reflector::store();
        let mut stream = pin!(reflector::reflector(
            writer,
            watcher(self.api.clone(), watcher::Config::default()).default_backoff(),
        ));

        let mut resync = tokio::time::interval(self.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the initial list covers it.
        resync.tick().await;

        loop {
            tokio::select! {
                event = stream.try_next() => {
                    match event {
                        Ok(Some(event)) => self.handle_event(event).await,
                        Ok(None) => {
                            warn!("ScyllaDBDatacenter watch stream ended");
                            return Ok(());
                        }
                        Err(e) => warn!("ScyllaDBDatacenter watch error: {}", e),
                    }
                }
                _ = resync.tick() => self.resync(&store).await,
            }
        }
    }

    async fn handle_event(&self, event: watcher::Event<ScyllaDBDatacenter>) {
        match event {
            watcher::Event::Apply(sdc) | watcher::Event::InitApply(sdc) => {
                debug!("ScyllaDBDatacenter applied: {}", obj_ref(&sdc));
                self.reconcile(&sdc).await;
            }
            watcher::Event::Delete(sdc) => {
                info!("ScyllaDBDatacenter deleted: {}", obj_ref(&sdc));
            }
            watcher::Event::Init => {
                debug!("ScyllaDBDatacenter watcher initialized");
            }
            watcher::Event::InitDone => {
                info!("ScyllaDBDatacenter watcher initialization complete");
            }
        }
    }

    async fn resync(&self, store: &Store<ScyllaDBDatacenter>) {
        let datacenters = store.state();
        debug!("Resyncing {} ScyllaDBDatacenter(s)", datacenters.len());

        for sdc in datacenters {
            self.reconcile(&sdc).await;
        }
    }

    async fn reconcile(&self, sdc: &ScyllaDBDatacenter) {
        if let Err(e) = self.reconciler.sync(sdc).await {
            error!("Failed to sync ScyllaDBDatacenter {}: {}", obj_ref(sdc), e);
        }
    }
}
