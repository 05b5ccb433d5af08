//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test objects and a reconciler
//! backed by in-memory caches and a recording status writer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use controller_helpers::lister::testing::store_with;
use crds::naming::{
    DELAYED_VOLUME_MOUNT_CONTAINER_NAME, RACK_NAME_LABEL, SCYLLA_CONTAINER_NAME,
    SCYLLADB_IGNITION_CONTAINER_NAME,
};
use crds::*;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec, StatefulSetStatus};
use k8s_openapi::api::core::v1::{
    Container, ContainerState, ContainerStateRunning, ContainerStatus, Pod, PodSpec, PodStatus,
    Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::status_writer::DatacenterStatusWriter;

pub const TEST_NAMESPACE: &str = "scylla";
pub const TEST_IMAGE: &str = "docker.io/scylladb/scylla:6.2.0";

/// Helper to create a test ScyllaDBDatacenter with the given racks
pub fn create_test_datacenter(racks: &[(&str, Option<i32>)]) -> ScyllaDBDatacenter {
    let mut sdc = ScyllaDBDatacenter::new(
        "basic",
        ScyllaDBDatacenterSpec {
            cluster_name: "basic".to_string(),
            datacenter_name: Some("dc1".to_string()),
            scylla_db: ScyllaDBTemplate {
                image: TEST_IMAGE.to_string(),
            },
            rack_template: None,
            racks: racks
                .iter()
                .map(|(name, nodes)| RackSpec {
                    name: name.to_string(),
                    nodes: *nodes,
                })
                .collect(),
        },
    );
    sdc.metadata.namespace = Some(TEST_NAMESPACE.to_string());
    sdc.metadata.uid = Some("sdc-uid".to_string());
    sdc.metadata.generation = Some(2);
    sdc.metadata.resource_version = Some("100".to_string());
    sdc
}

fn controller_ref<K: Resource<DynamicType = ()>>(name: &str, uid: &str) -> OwnerReference {
    OwnerReference {
        api_version: K::api_version(&()).to_string(),
        kind: K::kind(&()).to_string(),
        name: name.to_string(),
        uid: uid.to_string(),
        controller: Some(true),
        ..Default::default()
    }
}

/// Observed replica counts of a test StatefulSet
#[derive(Debug, Clone, Copy)]
pub struct Replicas {
    pub desired: i32,
    pub ready: i32,
    pub available: i32,
    pub updated: i32,
    pub current: i32,
}

impl Replicas {
    /// All counts equal to `n`
    pub fn all(n: i32) -> Self {
        Self {
            desired: n,
            ready: n,
            available: n,
            updated: n,
            current: n,
        }
    }
}

/// Helper to create the StatefulSet of a rack, controlled by `sdc`
pub fn create_test_stateful_set(
    sdc: &ScyllaDBDatacenter,
    rack_name: &str,
    replicas: Replicas,
    generation: i64,
    observed_generation: Option<i64>,
) -> StatefulSet {
    let rack = sdc
        .spec
        .racks
        .iter()
        .find(|r| r.name == rack_name)
        .cloned()
        .unwrap_or_else(|| RackSpec {
            name: rack_name.to_string(),
            nodes: None,
        });
    let name = naming::stateful_set_name_for_rack(&rack, sdc);

    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: sdc.namespace(),
            uid: Some(format!("{}-uid", name)),
            generation: Some(generation),
            labels: Some([(RACK_NAME_LABEL.to_string(), rack_name.to_string())].into()),
            owner_references: Some(vec![controller_ref::<ScyllaDBDatacenter>(
                &sdc.name_any(),
                sdc.uid().as_deref().unwrap_or_default(),
            )]),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas.desired),
            ..Default::default()
        }),
        status: Some(StatefulSetStatus {
            replicas: replicas.desired,
            ready_replicas: Some(replicas.ready),
            available_replicas: Some(replicas.available),
            updated_replicas: Some(replicas.updated),
            current_replicas: Some(replicas.current),
            observed_generation,
            ..Default::default()
        }),
    }
}

fn container_status(name: &str, ready: bool) -> ContainerStatus {
    ContainerStatus {
        name: name.to_string(),
        ready,
        state: Some(ContainerState {
            running: ready.then(ContainerStateRunning::default),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Helper to create a member pod controlled by `sts`
///
/// A prewarmed pod has its ignition container ready and its delayed volume
/// mount container running.
pub fn create_test_pod(sts: &StatefulSet, ordinal: i32, image: &str, prewarmed: bool) -> Pod {
    let name = format!("{}-{}", sts.name_any(), ordinal);
    Pod {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: sts.namespace(),
            owner_references: Some(vec![controller_ref::<StatefulSet>(
                &sts.name_any(),
                sts.uid().as_deref().unwrap_or_default(),
            )]),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: SCYLLA_CONTAINER_NAME.to_string(),
                image: Some(image.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            container_statuses: Some(vec![
                container_status(SCYLLADB_IGNITION_CONTAINER_NAME, prewarmed),
                container_status(DELAYED_VOLUME_MOUNT_CONTAINER_NAME, prewarmed),
            ]),
            ..Default::default()
        }),
    }
}

/// Helper to create a member Service named after its pod
pub fn create_test_service(name: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Status writer recording every write instead of calling the API server
#[derive(Default)]
pub struct RecordingStatusWriter {
    writes: Mutex<Vec<ScyllaDBDatacenterStatus>>,
    failure: Mutex<Option<String>>,
}

impl RecordingStatusWriter {
    pub fn writes(&self) -> Vec<ScyllaDBDatacenterStatus> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_write(&self) -> Option<ScyllaDBDatacenterStatus> {
        self.writes.lock().unwrap().last().cloned()
    }

    /// Make every subsequent write fail
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl DatacenterStatusWriter for RecordingStatusWriter {
    async fn write_status(
        &self,
        _sdc: &ScyllaDBDatacenter,
        status: &ScyllaDBDatacenterStatus,
    ) -> Result<(), ControllerError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ControllerError::Watch(message));
        }

        self.writes.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// Helper to create a reconciler over in-memory caches
pub fn create_test_reconciler(
    stateful_sets: Vec<StatefulSet>,
    pods: Vec<Pod>,
    services: Vec<Service>,
) -> (Reconciler, Arc<RecordingStatusWriter>) {
    let writer = Arc::new(RecordingStatusWriter::default());
    let reconciler = Reconciler::new(
        Arc::new(store_with(pods)),
        Arc::new(store_with(stateful_sets)),
        Arc::new(store_with(services)),
        writer.clone(),
    );
    (reconciler, writer)
}

/// Member Services and prewarmed pods for every replica of `sts`
pub fn create_test_members(sts: &StatefulSet, prewarmed: bool) -> (Vec<Pod>, Vec<Service>) {
    let replicas = sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
    (0..replicas)
        .map(|ordinal| {
            let pod = create_test_pod(sts, ordinal, TEST_IMAGE, prewarmed);
            let svc = create_test_service(&pod.name_any());
            (pod, svc)
        })
        .unzip()
}
