//! Status calculation for ScyllaDBDatacenter.
//!
//! Everything here except [`Reconciler::update_status`] is infallible: a
//! missing or unreadable object is reflected in the computed value itself
//! (zero counts, `stale`, empty version, `Prewarmed=False`) rather than
//! aborting the pass.

use std::collections::HashMap;
use std::sync::Arc;

use controller_helpers::pods::{
    is_controlled_by, is_delayed_volume_mount_container_running,
    is_scylladb_ignition_container_ready,
};
use controller_helpers::set_status_condition;
use crds::naming::{
    AS_EXPECTED_REASON, PREWARMED_CONDITION, first_member_name, image_to_version, manual_ref,
    member_service_name, obj_ref, pod_name_from_service, scylla_version,
    stateful_set_name_for_rack,
};
use crds::{ConditionStatus, RackSpec, RackStatus, ScyllaDBDatacenter, ScyllaDBDatacenterStatus};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, error, info, warn};

use crate::error::ControllerError;
use crate::reconciler::Reconciler;

pub const LOOKUP_FAILED_REASON: &str = "LookupFailed";
pub const NOT_ALL_NODES_PREWARMED_REASON: &str = "NotAllNodesPrewarmed";

impl Reconciler {
    /// Persists `status` unless it equals the stored one.
    ///
    /// Aggregated counts are recomputed right before the write.
    pub async fn update_status(
        &self,
        sdc: &ScyllaDBDatacenter,
        mut status: ScyllaDBDatacenterStatus,
    ) -> Result<(), ControllerError> {
        if sdc.status.as_ref() == Some(&status) {
            debug!("Status of ScyllaDBDatacenter {} is up to date", obj_ref(sdc));
            return Ok(());
        }

        update_aggregated_status_fields(&mut status);

        info!("Updating status of ScyllaDBDatacenter {}", obj_ref(sdc));
        self.status_writer.write_status(sdc, &status).await?;
        info!("Status of ScyllaDBDatacenter {} updated", obj_ref(sdc));

        Ok(())
    }

    /// Reads the ScyllaDB version running on the first node of `sts`.
    pub(crate) fn scylla_version_of(&self, sts: &StatefulSet) -> Result<String, ControllerError> {
        let namespace = sts.namespace().unwrap_or_default();
        let pod_name = first_member_name(&sts.name_any());
        let pod = self.pods.get(&namespace, &pod_name)?;

        let sts_uid = sts.uid().unwrap_or_default();
        if sts_uid.is_empty() || !is_controlled_by(&pod.metadata, &sts_uid) {
            return Err(ControllerError::ForeignPod(manual_ref(&namespace, &pod_name)));
        }

        let containers = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.as_slice())
            .unwrap_or_default();

        Ok(scylla_version(containers)?)
    }

    /// Computes the status of one rack from its StatefulSet, if observed.
    pub fn calculate_rack_status(
        &self,
        sdc: &ScyllaDBDatacenter,
        rack: &RackSpec,
        sts: Option<&StatefulSet>,
    ) -> RackStatus {
        let mut status = RackStatus {
            name: rack.name.clone(),
            stale: true,
            ..Default::default()
        };

        let Some(sts) = sts else {
            return status;
        };

        // An unset replica count defaults to 1 on the API server.
        status.nodes = sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
        if let Some(sts_status) = &sts.status {
            status.ready_nodes = sts_status.ready_replicas.unwrap_or(0);
            status.available_nodes = sts_status.available_replicas.unwrap_or(0);
            status.updated_nodes = sts_status.updated_replicas.unwrap_or(0);
            status.current_nodes = sts_status.current_replicas.unwrap_or(0);
        }

        let observed_generation = sts.status.as_ref().and_then(|s| s.observed_generation);
        status.stale = match observed_generation {
            Some(observed) => observed < sts.metadata.generation.unwrap_or(0),
            None => true,
        };

        let image = &sdc.spec.scylla_db.image;
        status.updated_version = match image_to_version(image) {
            Ok(version) => Some(version),
            Err(e) => {
                error!("Can't get version of image {:?}: {}", image, e);
                None
            }
        };

        if status.nodes == 0 {
            status.current_version = status.updated_version.clone();
        } else {
            match self.scylla_version_of(sts) {
                Ok(version) => status.current_version = Some(version),
                Err(e) => error!(
                    "Can't get scylla version of rack {} in ScyllaDBDatacenter {}: {}",
                    rack.name,
                    obj_ref(sdc),
                    e
                ),
            }
        }

        status
    }

    /// Computes the datacenter status from the given rack StatefulSets.
    ///
    /// Conditions are carried over from the stored status; rack statuses are
    /// rebuilt in the order of `spec.racks`.
    pub fn calculate_status(
        &self,
        sdc: &ScyllaDBDatacenter,
        stateful_sets: &HashMap<String, Arc<StatefulSet>>,
    ) -> ScyllaDBDatacenterStatus {
        let mut status = sdc.status.clone().unwrap_or_default();
        status.observed_generation = sdc.metadata.generation;

        status.racks = sdc
            .spec
            .racks
            .iter()
            .map(|rack| {
                let sts_name = stateful_set_name_for_rack(rack, sdc);
                self.calculate_rack_status(sdc, rack, stateful_sets.get(&sts_name).map(Arc::as_ref))
            })
            .collect();

        update_aggregated_status_fields(&mut status);

        status
    }

    /// Sets the `Prewarmed` condition on `status`.
    ///
    /// True only when every configured node has a member Service and a pod
    /// whose ignition container is ready and whose delayed volume mount
    /// container is running.
    pub fn set_prewarmed_status_condition(
        &self,
        sdc: &ScyllaDBDatacenter,
        status: &mut ScyllaDBDatacenterStatus,
        services: &HashMap<String, Arc<Service>>,
    ) {
        let (condition_status, reason, message) = match self.count_unprewarmed_nodes(sdc, services)
        {
            Ok(0) => (ConditionStatus::True, AS_EXPECTED_REASON, String::new()),
            Ok(pending) => (
                ConditionStatus::False,
                NOT_ALL_NODES_PREWARMED_REASON,
                format!("Not all nodes are prewarmed yet: {} pending.", pending),
            ),
            Err(lookup_error) => (
                ConditionStatus::False,
                LOOKUP_FAILED_REASON,
                format!("Can't determine whether nodes are prewarmed: {}", lookup_error),
            ),
        };

        set_status_condition(
            &mut status.conditions,
            PREWARMED_CONDITION,
            condition_status,
            reason,
            &message,
            sdc.metadata.generation,
        );
    }

    /// Number of configured nodes that are not prewarmed yet.
    ///
    /// Fails on the first node whose member Service or pod can't be found.
    fn count_unprewarmed_nodes(
        &self,
        sdc: &ScyllaDBDatacenter,
        services: &HashMap<String, Arc<Service>>,
    ) -> Result<usize, String> {
        let namespace = sdc.namespace().unwrap_or_default();
        let mut pending = 0;

        for rack in &sdc.spec.racks {
            let node_count = sdc.spec.rack_node_count(&rack.name).map_err(|e| {
                error!("Can't get node count of rack {} in {}: {}", rack.name, obj_ref(sdc), e);
                e.to_string()
            })?;

            for ordinal in 0..node_count {
                let svc_name = member_service_name(rack, sdc, ordinal);
                let Some(svc) = services.get(&svc_name) else {
                    let svc_ref = manual_ref(&namespace, &svc_name);
                    warn!("Service {} of rack {} does not exist", svc_ref, rack.name);
                    return Err(format!("service {} does not exist", svc_ref));
                };

                let pod_name = pod_name_from_service(svc);
                let pod = self.pods.get(&namespace, &pod_name).map_err(|e| {
                    warn!("Can't get pod of rack {}: {}", rack.name, e);
                    e.to_string()
                })?;

                if !is_scylladb_ignition_container_ready(&pod)
                    || !is_delayed_volume_mount_container_running(&pod)
                {
                    debug!("Pod {} is not prewarmed", manual_ref(&namespace, &pod_name));
                    pending += 1;
                }
            }
        }

        Ok(pending)
    }
}

/// Recomputes the datacenter-wide counts as sums over all racks.
pub fn update_aggregated_status_fields(status: &mut ScyllaDBDatacenterStatus) {
    status.nodes = status.racks.iter().map(|r| r.nodes).sum();
    status.ready_nodes = status.racks.iter().map(|r| r.ready_nodes).sum();
    status.available_nodes = status.racks.iter().map(|r| r.available_nodes).sum();
}
