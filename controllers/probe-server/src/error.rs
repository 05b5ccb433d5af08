//! Probe server error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the probe server.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A configured path could not be inspected
    #[error("can't stat path {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The per-request deadline passed before the check finished
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Listener or server I/O failure
    #[error("Server error: {0}")]
    Server(#[from] io::Error),
}
