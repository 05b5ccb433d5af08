//! ScyllaDB Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions and naming conventions shared by
//! the datacenter status controller and the node API-status probe.

pub mod naming;
pub mod scylla_db_datacenter;

pub use naming::NamingError;
pub use scylla_db_datacenter::*;
