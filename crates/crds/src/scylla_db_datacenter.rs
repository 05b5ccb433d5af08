//! ScyllaDBDatacenter CRD
//!
//! Describes one ScyllaDB datacenter divided into racks. The spec is owned by
//! users; the status is owned by the datacenter status controller.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::naming::NamingError;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "scylla.scylladb.com",
    version = "v1alpha1",
    kind = "ScyllaDBDatacenter",
    plural = "scylladbdatacenters",
    shortname = "sdc",
    namespaced,
    status = "ScyllaDBDatacenterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ScyllaDBDatacenterSpec {
    /// Name of the ScyllaDB cluster this datacenter belongs to
    pub cluster_name: String,

    /// Gossip datacenter name (defaults to the object name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter_name: Option<String>,

    /// ScyllaDB container settings
    #[serde(rename = "scyllaDB")]
    pub scylla_db: ScyllaDBTemplate,

    /// Defaults applied to every rack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_template: Option<RackTemplate>,

    /// Racks, in display order
    #[serde(default)]
    pub racks: Vec<RackSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScyllaDBTemplate {
    /// Container image reference, e.g. `docker.io/scylladb/scylla:6.2.0`
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RackTemplate {
    /// Default number of nodes per rack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RackSpec {
    /// Rack name, unique within the datacenter
    pub name: String,

    /// Number of nodes in this rack (overrides the rack template)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<i32>,
}

impl ScyllaDBDatacenterSpec {
    /// Returns the configured node count for a rack.
    ///
    /// The rack's own value wins over the rack template; a rack with neither
    /// has zero nodes. Unknown rack names are an error.
    pub fn rack_node_count(&self, rack_name: &str) -> Result<i32, NamingError> {
        let rack = self
            .racks
            .iter()
            .find(|r| r.name == rack_name)
            .ok_or_else(|| NamingError::UnknownRack(rack_name.to_string()))?;

        if let Some(nodes) = rack.nodes {
            return Ok(nodes);
        }

        Ok(self
            .rack_template
            .as_ref()
            .and_then(|t| t.nodes)
            .unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScyllaDBDatacenterStatus {
    /// Generation of the spec this status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Sum of `nodes` over all racks
    #[serde(default)]
    pub nodes: i32,

    /// Sum of `readyNodes` over all racks
    #[serde(default)]
    pub ready_nodes: i32,

    /// Sum of `availableNodes` over all racks
    #[serde(default)]
    pub available_nodes: i32,

    /// Per-rack status, in the order of `spec.racks`
    #[serde(default)]
    pub racks: Vec<RackStatus>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RackStatus {
    pub name: String,

    /// ScyllaDB version running on the rack's first node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,

    /// ScyllaDB version the rack is being moved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_version: Option<String>,

    #[serde(default)]
    pub nodes: i32,

    #[serde(default)]
    pub current_nodes: i32,

    #[serde(default)]
    pub updated_nodes: i32,

    #[serde(default)]
    pub ready_nodes: i32,

    #[serde(default)]
    pub available_nodes: i32,

    /// True while the rack's StatefulSet hasn't observed its latest generation
    #[serde(default)]
    pub stale: bool,
}

/// Condition following the Kubernetes `metav1.Condition` shape.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the condition's status changed
    pub last_transition_time: DateTime<Utc>,

    pub reason: String,

    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}
