//! ScyllaDB REST API Client
//!
//! A small client for the administrative REST API exposed by every ScyllaDB
//! process. It answers the questions a node health check needs: is the API
//! reachable, which members does the node see and in which state, what is
//! the node's own host ID, and is the CQL native transport enabled.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use scylla_client::{ScyllaClient, DEFAULT_API_PORT};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ScyllaClient::for_localhost(DEFAULT_API_PORT, Duration::from_secs(30))?;
//!
//! let host_id = client.local_host_id(false).await?;
//! let joined = client
//!     .status()
//!     .await?
//!     .iter()
//!     .any(|s| s.host_id == host_id && s.is_un());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod scylla_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{DEFAULT_API_PORT, LocalhostClientFactory, ScyllaClient};
pub use error::ScyllaError;
pub use models::*;
pub use scylla_trait::{ScyllaClientFactory, ScyllaClientTrait};
#[cfg(feature = "test-util")]
pub use mock::{MockScyllaClient, MockScyllaClientFactory};
