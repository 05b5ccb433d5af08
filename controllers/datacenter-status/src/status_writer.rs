//! Persistence of computed datacenter status.

use async_trait::async_trait;
use crds::{ScyllaDBDatacenter, ScyllaDBDatacenterStatus};
use kube::api::{Patch, PatchParams};
use crds::naming::obj_ref;
use kube::{Api, Client, ResourceExt};
use serde_json::{Value, json};

use crate::error::ControllerError;

/// Writes the status sub-resource of a datacenter.
#[async_trait]
pub trait DatacenterStatusWriter: Send + Sync {
    /// Replaces the stored status of `sdc` with `status`.
    ///
    /// The write is conditional on the resource version `sdc` was read at.
    async fn write_status(
        &self,
        sdc: &ScyllaDBDatacenter,
        status: &ScyllaDBDatacenterStatus,
    ) -> Result<(), ControllerError>;
}

/// [`DatacenterStatusWriter`] backed by the Kubernetes API.
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DatacenterStatusWriter for KubeStatusWriter {
    async fn write_status(
        &self,
        sdc: &ScyllaDBDatacenter,
        status: &ScyllaDBDatacenterStatus,
    ) -> Result<(), ControllerError> {
        let namespace = sdc.namespace().ok_or_else(|| {
            ControllerError::InvalidConfig("ScyllaDBDatacenter missing namespace".to_string())
        })?;
        let api: Api<ScyllaDBDatacenter> = Api::namespaced(self.client.clone(), &namespace);
        let patch = status_patch(sdc, status)?;

        api.patch_status(&sdc.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }
}

/// Merge patch replacing the status of `sdc`.
///
/// Carries the resource version `sdc` was read at, which turns the patch
/// into a compare-and-swap.
fn status_patch(
    sdc: &ScyllaDBDatacenter,
    status: &ScyllaDBDatacenterStatus,
) -> Result<Value, ControllerError> {
    let resource_version = sdc.resource_version().ok_or_else(|| {
        ControllerError::InvalidConfig(format!(
            "ScyllaDBDatacenter {} has no resourceVersion",
            obj_ref(sdc)
        ))
    })?;

    Ok(json!({
        "metadata": { "resourceVersion": resource_version },
        "status": serde_json::to_value(status)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_datacenter;

    #[test]
    fn test_status_patch_is_conditional_on_resource_version() {
        let sdc = create_test_datacenter(&[("a", Some(1))]);
        let status = ScyllaDBDatacenterStatus {
            nodes: 1,
            ..Default::default()
        };

        let patch = status_patch(&sdc, &status).unwrap();

        assert_eq!(patch["metadata"]["resourceVersion"], "100");
        assert_eq!(patch["status"]["nodes"], 1);
    }

    #[test]
    fn test_status_patch_requires_resource_version() {
        let mut sdc = create_test_datacenter(&[("a", Some(1))]);
        sdc.metadata.resource_version = None;

        let err = status_patch(&sdc, &ScyllaDBDatacenterStatus::default()).unwrap_err();

        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }
}
