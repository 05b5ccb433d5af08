//! Pod ownership and container state checks.

use crds::naming::{DELAYED_VOLUME_MOUNT_CONTAINER_NAME, SCYLLADB_IGNITION_CONTAINER_NAME};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// Returns the owner reference marked as controller, if any.
pub fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    meta.owner_references
        .as_deref()?
        .iter()
        .find(|r| r.controller == Some(true))
}

/// True when the controlling owner of `meta` has the given UID.
pub fn is_controlled_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    controller_of(meta).is_some_and(|r| r.uid == owner_uid)
}

fn container_status<'a>(pod: &'a Pod, container_name: &str) -> Option<&'a ContainerStatus> {
    let status = pod.status.as_ref()?;
    status
        .container_statuses
        .iter()
        .flatten()
        .chain(status.init_container_statuses.iter().flatten())
        .find(|cs| cs.name == container_name)
}

pub fn is_container_ready(pod: &Pod, container_name: &str) -> bool {
    container_status(pod, container_name).is_some_and(|cs| cs.ready)
}

pub fn is_container_running(pod: &Pod, container_name: &str) -> bool {
    container_status(pod, container_name)
        .and_then(|cs| cs.state.as_ref())
        .is_some_and(|state| state.running.is_some())
}

pub fn is_scylladb_ignition_container_ready(pod: &Pod) -> bool {
    is_container_ready(pod, SCYLLADB_IGNITION_CONTAINER_NAME)
}

pub fn is_delayed_volume_mount_container_running(pod: &Pod) -> bool {
    is_container_running(pod, DELAYED_VOLUME_MOUNT_CONTAINER_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ContainerState, ContainerStateRunning, PodStatus};

    fn owner(uid: &str, controller: bool) -> OwnerReference {
        OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "StatefulSet".to_string(),
            name: "basic-dc1-a".to_string(),
            uid: uid.to_string(),
            controller: Some(controller),
            ..Default::default()
        }
    }

    fn status(name: &str, ready: bool, running: bool) -> ContainerStatus {
        ContainerStatus {
            name: name.to_string(),
            ready,
            state: Some(ContainerState {
                running: running.then(ContainerStateRunning::default),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_controller_of_skips_non_controller_owners() {
        let meta = ObjectMeta {
            owner_references: Some(vec![owner("other", false), owner("sts-uid", true)]),
            ..Default::default()
        };

        assert_eq!(controller_of(&meta).map(|r| r.uid.as_str()), Some("sts-uid"));
        assert!(is_controlled_by(&meta, "sts-uid"));
        assert!(!is_controlled_by(&meta, "other"));
    }

    #[test]
    fn test_no_owner_is_not_controlled() {
        assert!(!is_controlled_by(&ObjectMeta::default(), "sts-uid"));
    }

    #[test]
    fn test_container_checks_look_at_init_containers_too() {
        let pod = Pod {
            status: Some(PodStatus {
                container_statuses: Some(vec![status(SCYLLADB_IGNITION_CONTAINER_NAME, true, true)]),
                init_container_statuses: Some(vec![status(
                    DELAYED_VOLUME_MOUNT_CONTAINER_NAME,
                    false,
                    true,
                )]),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(is_scylladb_ignition_container_ready(&pod));
        assert!(is_delayed_volume_mount_container_running(&pod));
        assert!(!is_container_ready(&pod, DELAYED_VOLUME_MOUNT_CONTAINER_NAME));
    }

    #[test]
    fn test_missing_status_is_not_ready() {
        let pod = Pod::default();
        assert!(!is_scylladb_ignition_container_ready(&pod));
        assert!(!is_delayed_volume_mount_container_running(&pod));

        let pod = Pod {
            status: Some(PodStatus {
                container_statuses: Some(vec![status(SCYLLADB_IGNITION_CONTAINER_NAME, false, false)]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!is_scylladb_ignition_container_ready(&pod));
    }
}
