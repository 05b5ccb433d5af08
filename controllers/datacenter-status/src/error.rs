//! Controller-specific error types.

use controller_helpers::LookupError;
use crds::NamingError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the datacenter status controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Cache lookup failed for a reason other than absence
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Name or version could not be derived
    #[error("{0}")]
    Naming(#[from] NamingError),

    /// Pod is not controlled by the StatefulSet it was looked up for
    #[error("foreign pod {0:?}")]
    ForeignPod(String),

    /// Status could not be encoded for the patch
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
