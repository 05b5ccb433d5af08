//! Naming conventions shared by the controller and the node probe.
//!
//! Object names, well-known labels and container names are derived here so
//! every component agrees on them.

use k8s_openapi::api::core::v1::{Container, Service};
use kube::ResourceExt;
use thiserror::Error;

use crate::{RackSpec, ScyllaDBDatacenter};

/// Present on a member Service while an operator keeps the node in maintenance
pub const NODE_MAINTENANCE_LABEL: &str = "scylla/node-maintenance";
pub const RACK_NAME_LABEL: &str = "scylla/rack";

pub const SCYLLA_CONTAINER_NAME: &str = "scylla";
pub const SCYLLADB_IGNITION_CONTAINER_NAME: &str = "scylladb-ignition";
pub const DELAYED_VOLUME_MOUNT_CONTAINER_NAME: &str = "delayed-volume-mount";

pub const PREWARMED_CONDITION: &str = "Prewarmed";
pub const AS_EXPECTED_REASON: &str = "AsExpected";

/// Errors produced while deriving names or versions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("can't find rack {0:?} in rack spec")]
    UnknownRack(String),

    #[error("can't parse version from image {0:?}")]
    InvalidImage(String),

    #[error("container {0:?} not found")]
    ContainerNotFound(String),

    #[error("container {0:?} has no image")]
    MissingImage(String),
}

/// Formats a `namespace/name` reference for log records.
pub fn manual_ref(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Reference of a datacenter object for log records.
pub fn obj_ref(sdc: &ScyllaDBDatacenter) -> String {
    manual_ref(&sdc.namespace().unwrap_or_default(), &sdc.name_any())
}

/// Datacenter name used in gossip, defaulting to the object name.
pub fn gossip_datacenter_name(sdc: &ScyllaDBDatacenter) -> String {
    sdc.spec
        .datacenter_name
        .clone()
        .unwrap_or_else(|| sdc.name_any())
}

/// Name of the StatefulSet backing a rack.
pub fn stateful_set_name_for_rack(rack: &RackSpec, sdc: &ScyllaDBDatacenter) -> String {
    format!(
        "{}-{}-{}",
        sdc.name_any(),
        gossip_datacenter_name(sdc),
        rack.name
    )
}

/// Name of the per-node Service for the given ordinal of a rack.
pub fn member_service_name(rack: &RackSpec, sdc: &ScyllaDBDatacenter, ordinal: i32) -> String {
    format!("{}-{}", stateful_set_name_for_rack(rack, sdc), ordinal)
}

/// Member Services are named after the pod they expose.
pub fn pod_name_from_service(svc: &Service) -> String {
    svc.name_any()
}

/// Name of the first ordinal pod of a StatefulSet.
pub fn first_member_name(stateful_set_name: &str) -> String {
    format!("{}-0", stateful_set_name)
}

/// Extracts the version (tag) from a container image reference.
///
/// Registry ports are not mistaken for tags and digests are ignored, so
/// `registry:5000/scylladb/scylla:6.2.0@sha256:...` yields `6.2.0`.
pub fn image_to_version(image: &str) -> Result<String, NamingError> {
    let without_digest = image.split_once('@').map_or(image, |(name, _)| name);
    let name_start = without_digest.rfind('/').map_or(0, |i| i + 1);

    match without_digest[name_start..].rsplit_once(':') {
        Some((repository, tag)) if !repository.is_empty() && !tag.is_empty() => {
            Ok(tag.to_string())
        }
        _ => Err(NamingError::InvalidImage(image.to_string())),
    }
}

/// Reads the ScyllaDB version from the `scylla` container of a pod spec.
pub fn scylla_version(containers: &[Container]) -> Result<String, NamingError> {
    let container = containers
        .iter()
        .find(|c| c.name == SCYLLA_CONTAINER_NAME)
        .ok_or_else(|| NamingError::ContainerNotFound(SCYLLA_CONTAINER_NAME.to_string()))?;

    let image = container
        .image
        .as_deref()
        .ok_or_else(|| NamingError::MissingImage(SCYLLA_CONTAINER_NAME.to_string()))?;

    image_to_version(image)
}
