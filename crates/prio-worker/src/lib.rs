//! Process-level coordinator tying the queue engine, coordination client,
//! and elector together; also hosts the HTTP surface and CLI/config
//! loading used to build a running worker.
//!
//! [`worker::Worker`] is the seam the rest of this crate is built around —
//! generic over [`prio_coordination::CoordinationClient`] and
//! [`prio_queue::QueueBackend`] so the same supervisor logic runs against
//! either the in-memory stack (tests, single-node trials) or the
//! production ZooKeeper/Postgres stack.

pub mod cli;
pub mod config;
mod error;
pub mod http;
mod paths;
pub mod worker;

pub use config::Config;
pub use error::{WorkerError, WorkerResult};
pub use worker::{Worker, LEASE, MAINTENANCE_TICK};
