use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::JobId;

/// Ordering key for the per-topic pending max-heap: highest priority first,
/// ties broken by lowest `updated_at`, then lowest id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingKey {
    pub priority: i32,
    pub updated_at: DateTime<Utc>,
    pub id: JobId,
}

impl Ord for PendingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.updated_at.cmp(&self.updated_at))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for PendingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
