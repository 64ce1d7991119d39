use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::CoordResult;

/// Fires exactly once when the watched condition changes, then is dropped.
/// Re-arming a watch after it fires means calling the `*_watch` method again.
pub type WatchOnce = oneshot::Receiver<()>;

/// Minimal coordination-service surface the rest of `prio` builds on:
/// persistent and ephemeral znodes, one-shot existence/children watches,
/// and plain get/set/delete. [`crate::zk::ZkClient`] implements this against
/// a real ensemble; [`crate::memory::InMemoryClient`] implements it
/// in-process for tests and single-node deployments.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Creates `path` with empty data if it does not already exist. Never
    /// ephemeral; used to lay down the namespace/election/members/partition
    /// skeleton nodes.
    async fn ensure_persistent(&self, path: &str) -> CoordResult<()>;

    /// Creates an ephemeral node at exactly `path`. Fails with
    /// [`crate::error::CoordError::NodeExists`] if it is already present.
    async fn create_ephemeral(&self, path: &str, data: Vec<u8>) -> CoordResult<()>;

    /// Creates an ephemeral node under `parent` with a monotonically
    /// increasing sequence suffix and returns the full assigned path.
    async fn create_ephemeral_sequential(&self, parent: &str, data: Vec<u8>) -> CoordResult<String>;

    /// Returns whether `path` currently exists, plus a watch that fires
    /// once the next time that existence changes (create, delete, or data
    /// change).
    async fn exists_watch(&self, path: &str) -> CoordResult<(bool, WatchOnce)>;

    /// Immediate children of `path`, unsorted.
    async fn children(&self, path: &str) -> CoordResult<Vec<String>>;

    /// Immediate children of `path` plus a watch that fires once the next
    /// time the child set changes.
    async fn children_watch(&self, path: &str) -> CoordResult<(Vec<String>, WatchOnce)>;

    /// Reads the data stored at `path`.
    async fn get(&self, path: &str) -> CoordResult<Vec<u8>>;

    /// Overwrites the data stored at `path`.
    async fn set(&self, path: &str, data: Vec<u8>) -> CoordResult<()>;

    /// Deletes `path`.
    async fn delete(&self, path: &str) -> CoordResult<()>;
}
