pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Job, JobId, QueueResult, Topic};

/// Storage primitives behind the queue's transactional semantics. A
/// production implementation (`postgres`) uses row-level locks inside a
/// serializable transaction; the `memory` implementation uses a single
/// mutex to stand in for those locks.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Create a topic row. Names are unique.
    async fn register_topic(&self, name: &str, description: Option<String>) -> QueueResult<()>;

    /// All registered topic names.
    async fn get_topics(&self) -> QueueResult<Vec<String>>;

    /// Fetch a topic by name, if registered.
    async fn get_topic(&self, name: &str) -> QueueResult<Option<Topic>>;

    /// Insert a new Pending job. Returns the store-assigned monotonic id.
    async fn enqueue(&self, topic: &str, priority: i32, payload: Vec<u8>) -> QueueResult<JobId>;

    /// Claim the highest-priority Pending job on `topic` for `consumer`.
    /// `Ok(None)` if no Pending job exists.
    async fn dequeue(&self, topic: &str, consumer: &str) -> QueueResult<Option<Job>>;

    /// Acknowledge completion of `job_id` by `consumer`.
    async fn ack(&self, topic: &str, job_id: JobId, consumer: &str) -> QueueResult<()>;

    /// Move every Claimed job on `topic` with `claimed_at < cutoff` back to
    /// Pending. Returns the number of rows changed.
    async fn requeue(&self, topic: &str, cutoff: DateTime<Utc>) -> QueueResult<u64>;
}
