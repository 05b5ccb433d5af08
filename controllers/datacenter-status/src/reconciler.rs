//! Reconciliation of ScyllaDBDatacenter status.
//!
//! A pass reads a point-in-time view of the datacenter's rack StatefulSets
//! and member Services from the local caches, recomputes the status and
//! persists it only when it changed. Status computation lives in
//! `status.rs`.

use std::collections::HashMap;
use std::sync::Arc;

use controller_helpers::ObjectLister;
use controller_helpers::pods::is_controlled_by;
use crds::naming::{member_service_name, obj_ref, stateful_set_name_for_rack};
use crds::ScyllaDBDatacenter;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::ResourceExt;
use tracing::{debug, info, warn};

use crate::error::ControllerError;
use crate::status_writer::DatacenterStatusWriter;

/// Reconciles ScyllaDBDatacenter status.
pub struct Reconciler {
    pub(crate) pods: Arc<dyn ObjectLister<Pod>>,
    pub(crate) stateful_sets: Arc<dyn ObjectLister<StatefulSet>>,
    pub(crate) services: Arc<dyn ObjectLister<Service>>,
    pub(crate) status_writer: Arc<dyn DatacenterStatusWriter>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        pods: Arc<dyn ObjectLister<Pod>>,
        stateful_sets: Arc<dyn ObjectLister<StatefulSet>>,
        services: Arc<dyn ObjectLister<Service>>,
        status_writer: Arc<dyn DatacenterStatusWriter>,
    ) -> Self {
        Self {
            pods,
            stateful_sets,
            services,
            status_writer,
        }
    }

    /// Runs one status pass for `sdc`.
    ///
    /// Lookup failures are reflected in the computed status; only the status
    /// write can fail the pass.
    pub async fn sync(&self, sdc: &ScyllaDBDatacenter) -> Result<(), ControllerError> {
        let namespace = sdc.namespace().unwrap_or_default();

        info!("Syncing ScyllaDBDatacenter {}", obj_ref(sdc));

        let stateful_sets = self.rack_stateful_sets(sdc, &namespace);
        let services = self.member_services(sdc, &namespace);

        let mut status = self.calculate_status(sdc, &stateful_sets);
        self.set_prewarmed_status_condition(sdc, &mut status, &services);

        self.update_status(sdc, status).await
    }

    /// StatefulSets of the datacenter's racks, keyed by name.
    ///
    /// StatefulSets controlled by some other object, or that can't be read
    /// from the cache, are left out, so their racks report as absent.
    fn rack_stateful_sets(
        &self,
        sdc: &ScyllaDBDatacenter,
        namespace: &str,
    ) -> HashMap<String, Arc<StatefulSet>> {
        let sdc_uid = sdc.uid();
        let mut stateful_sets = HashMap::new();

        for rack in &sdc.spec.racks {
            let name = stateful_set_name_for_rack(rack, sdc);
            let sts = match self.stateful_sets.get_optional(namespace, &name) {
                Ok(Some(sts)) => sts,
                Ok(None) => {
                    debug!("StatefulSet {}/{} not found, rack {} is absent", namespace, name, rack.name);
                    continue;
                }
                Err(e) => {
                    warn!("Can't get StatefulSet of rack {}, treating it as absent: {}", rack.name, e);
                    continue;
                }
            };

            let foreign = sdc_uid
                .as_deref()
                .is_some_and(|uid| !is_controlled_by(&sts.metadata, uid));
            if foreign {
                warn!(
                    "Ignoring StatefulSet {}/{} not controlled by ScyllaDBDatacenter {}",
                    namespace,
                    name,
                    obj_ref(sdc)
                );
                continue;
            }

            stateful_sets.insert(name, sts);
        }

        stateful_sets
    }

    /// Member Services of every configured node, keyed by name.
    ///
    /// Services that can't be read from the cache are left out; the
    /// `Prewarmed` condition reports them as a failed lookup.
    fn member_services(
        &self,
        sdc: &ScyllaDBDatacenter,
        namespace: &str,
    ) -> HashMap<String, Arc<Service>> {
        let mut services = HashMap::new();

        for rack in &sdc.spec.racks {
            let node_count = match sdc.spec.rack_node_count(&rack.name) {
                Ok(count) => count,
                Err(e) => {
                    warn!("Can't get node count of rack {} in {}: {}", rack.name, obj_ref(sdc), e);
                    continue;
                }
            };

            for ordinal in 0..node_count {
                let name = member_service_name(rack, sdc, ordinal);
                match self.services.get_optional(namespace, &name) {
                    Ok(Some(svc)) => {
                        services.insert(name, svc);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Can't get member Service of rack {}: {}", rack.name, e),
                }
            }
        }

        services
    }
}
