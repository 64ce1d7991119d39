//! Coordination-service client used for leader election and membership
//! tracking. [`CoordinationClient`] is the seam; [`InMemoryClient`] backs
//! tests and single-node runs, [`zk::ZkClient`] backs real deployments.

mod client;
mod error;
mod memory;

#[cfg(feature = "zookeeper")]
pub mod zk;

pub use client::{CoordinationClient, WatchOnce};
pub use error::{CoordError, CoordResult};
pub use memory::InMemoryClient;
