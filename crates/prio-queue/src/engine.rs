use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::backend::QueueBackend;
use crate::{Job, JobId, QueueResult, Topic};

/// Thin wrapper over a [`QueueBackend`] adding tracing spans around every
/// operation. Holds no state of its own beyond the backend.
pub struct QueueEngine<B: QueueBackend> {
    backend: B,
}

impl<B: QueueBackend> QueueEngine<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[instrument(skip(self, description))]
    pub async fn register_topic(&self, name: &str, description: Option<String>) -> QueueResult<()> {
        self.backend.register_topic(name, description).await?;
        info!(topic = name, "topic registered");
        Ok(())
    }

    pub async fn get_topics(&self) -> QueueResult<Vec<String>> {
        self.backend.get_topics().await
    }

    pub async fn get_topic(&self, name: &str) -> QueueResult<Option<Topic>> {
        self.backend.get_topic(name).await
    }

    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn enqueue(&self, topic: &str, priority: i32, payload: Vec<u8>) -> QueueResult<JobId> {
        let id = self.backend.enqueue(topic, priority, payload).await?;
        debug!(topic, job_id = %id, priority, "job enqueued");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn dequeue(&self, topic: &str, consumer: &str) -> QueueResult<Option<Job>> {
        let job = self.backend.dequeue(topic, consumer).await?;
        if let Some(job) = &job {
            debug!(topic, job_id = %job.id, consumer, "job claimed");
        }
        Ok(job)
    }

    #[instrument(skip(self))]
    pub async fn ack(&self, topic: &str, job_id: JobId, consumer: &str) -> QueueResult<()> {
        self.backend.ack(topic, job_id, consumer).await?;
        debug!(topic, job_id = %job_id, consumer, "job acked");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn requeue(&self, topic: &str, cutoff: DateTime<Utc>) -> QueueResult<u64> {
        let count = self.backend.requeue(topic, cutoff).await?;
        if count > 0 {
            warn!(topic, count, "jobs requeued after lease expiry");
        }
        Ok(count)
    }
}
