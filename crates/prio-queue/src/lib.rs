//! Durable, transactional priority job queue.
//!
//! [`backend::QueueBackend`] is the storage seam: [`backend::memory::MemoryBackend`]
//! is the in-process implementation used by tests and the `memory` feature,
//! [`backend::postgres::PostgresBackend`] is the relational implementation used
//! in production. [`engine::QueueEngine`] wraps either one with tracing.

pub mod backend;
mod engine;
mod error;
mod types;

pub use backend::QueueBackend;
pub use backend::memory::MemoryBackend;
#[cfg(feature = "postgres")]
pub use backend::postgres::PostgresBackend;
pub use engine::QueueEngine;
pub use error::{QueueError, QueueResult};
pub use types::{Job, JobId, JobStatus, Topic};
