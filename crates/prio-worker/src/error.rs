use prio_coordination::CoordError;
use prio_elector::ElectError;
use prio_queue::QueueError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors the Worker surfaces from start-up and the supervisor loop. Queue
/// operations called through the API façade propagate `QueueError`
/// directly rather than being wrapped here — see [`crate::worker::Worker`].
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordError),

    #[error("election error: {0}")]
    Election(#[from] ElectError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("malformed partition document: {0}")]
    Partition(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),
}
