use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Domain-level errors for queue operations
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    #[error("topic not found: {0}")]
    UnknownTopic(String),

    #[error("topic already exists: {0}")]
    AlreadyExists(String),

    #[error("job not found: {0}")]
    NotPresent(i64),

    #[error("job {0} already acked")]
    AlreadyAcked(i64),

    #[error("lease exceeded for job {0}, it has already been requeued")]
    LeaseExceeded(i64),

    #[error("job {job_id} is claimed by a different consumer")]
    WrongConsumer { job_id: i64 },

    #[error("job {0} could not be acquired, retry the dequeue")]
    NotAcquired(i64),

    #[error("store error: {0}")]
    General(String),
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::General(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::General("row not found".to_string()),
            other => Self::General(other.to_string()),
        }
    }
}
