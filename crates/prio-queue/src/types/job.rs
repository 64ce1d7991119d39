use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobId;

/// Job lifecycle status. Completed is terminal; the only other arrows are
/// Pending -> Claimed (dequeue), Claimed -> Completed (ack), and
/// Claimed -> Pending (requeue after the lease expires).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Claimed,
    Completed,
}

impl JobStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Completed => "completed",
        }
    }
}

/// A unit of work on exactly one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub topic: String,
    pub payload: Vec<u8>,
    pub priority: i32,
    pub status: JobStatus,

    /// `None` until the job is claimed by a consumer.
    pub claimed_at: Option<DateTime<Utc>>,
    /// `None` until the job is claimed by a consumer.
    pub claimed_by: Option<String>,
    /// `None` until the job is acked.
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A Claimed job always has both claim fields set; a Pending job has
    /// neither.
    pub fn claim_fields_consistent(&self) -> bool {
        match self.status {
            JobStatus::Claimed => self.claimed_by.is_some() && self.claimed_at.is_some(),
            JobStatus::Pending => self.claimed_by.is_none() && self.claimed_at.is_none(),
            JobStatus::Completed => true,
        }
    }
}
