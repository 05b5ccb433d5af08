//! ScyllaDB REST API models
//!
//! Only the small subset of the API needed to judge a node's membership
//! state is modelled here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry of `/storage_service/host_id` (endpoint address to host ID)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostIdMapping {
    /// Node address
    pub key: String,
    /// Host ID
    pub value: String,
}

/// Gossip liveness of a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeStatus {
    Up,
    Down,
}

/// Ring membership state of a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeState {
    Normal,
    Joining,
    Leaving,
    Moving,
}

/// Status of one cluster member as seen by the local node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeStatusInfo {
    pub addr: String,
    pub host_id: String,
    pub status: NodeStatus,
    pub state: NodeState,
}

impl NodeStatusInfo {
    /// Up and Normal: fully joined and not transitioning.
    pub fn is_un(&self) -> bool {
        self.status == NodeStatus::Up && self.state == NodeState::Normal
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Up => write!(f, "U"),
            NodeStatus::Down => write!(f, "D"),
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Normal => write!(f, "N"),
            NodeState::Joining => write!(f, "J"),
            NodeState::Leaving => write!(f, "L"),
            NodeState::Moving => write!(f, "M"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(status: NodeStatus, state: NodeState) -> NodeStatusInfo {
        NodeStatusInfo {
            addr: "10.0.0.1".to_string(),
            host_id: "host-1".to_string(),
            status,
            state,
        }
    }

    #[test]
    fn test_is_un_only_for_up_normal() {
        assert!(node(NodeStatus::Up, NodeState::Normal).is_un());
        assert!(!node(NodeStatus::Down, NodeState::Normal).is_un());
        assert!(!node(NodeStatus::Up, NodeState::Joining).is_un());
        assert!(!node(NodeStatus::Up, NodeState::Leaving).is_un());
        assert!(!node(NodeStatus::Up, NodeState::Moving).is_un());
    }

    #[test]
    fn test_display_matches_nodetool_notation() {
        let n = node(NodeStatus::Up, NodeState::Joining);
        assert_eq!(format!("{}{}", n.status, n.state), "UJ");
    }
}
