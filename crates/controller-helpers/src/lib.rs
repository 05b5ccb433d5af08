//! Controller Helpers
//!
//! Building blocks shared by the datacenter status controller and the node
//! API-status probe:
//! - `lister` - read-only lookups against reflector caches
//! - `errors` - collecting several independent failures into one error
//! - `conditions` - status condition merging with transition-time semantics
//! - `pods` - ownership and container state checks
//! - `telemetry` - tracing subscriber setup for the binaries

pub mod conditions;
pub mod errors;
pub mod lister;
pub mod pods;
pub mod telemetry;

pub use conditions::{find_condition, set_status_condition};
pub use errors::{AggregateError, aggregate};
pub use lister::{LookupError, ObjectLister};
