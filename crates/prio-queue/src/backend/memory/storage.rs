use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::heap::PendingKey;
use crate::backend::QueueBackend;
use crate::{Job, JobId, JobStatus, QueueError, QueueResult, Topic};

/// In-process queue backend. Stands in for the relational store in tests:
/// a single `RwLock` plays the role the Postgres backend gives to
/// `SELECT ... FOR UPDATE` inside a transaction, so dequeue/ack/requeue
/// calls on the same topic serialize the same way.
#[derive(Default)]
pub struct MemoryBackend {
    topics: RwLock<HashMap<String, Topic>>,
    jobs: RwLock<HashMap<JobId, Job>>,
    pending: RwLock<HashMap<String, BinaryHeap<PendingKey>>>,
    next_id: AtomicI64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, AtomicOrdering::Relaxed) + 1)
    }
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn register_topic(&self, name: &str, description: Option<String>) -> QueueResult<()> {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Err(QueueError::AlreadyExists(name.to_string()));
        }
        topics.insert(name.to_string(), Topic::new(name, description));
        Ok(())
    }

    async fn get_topics(&self) -> QueueResult<Vec<String>> {
        Ok(self.topics.read().keys().cloned().collect())
    }

    async fn get_topic(&self, name: &str) -> QueueResult<Option<Topic>> {
        Ok(self.topics.read().get(name).cloned())
    }

    async fn enqueue(&self, topic: &str, priority: i32, payload: Vec<u8>) -> QueueResult<JobId> {
        if !self.topics.read().contains_key(topic) {
            return Err(QueueError::UnknownTopic(topic.to_string()));
        }

        let now = Utc::now();
        let id = self.alloc_id();
        let job = Job {
            id,
            topic: topic.to_string(),
            payload,
            priority,
            status: JobStatus::Pending,
            claimed_at: None,
            claimed_by: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.pending
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(PendingKey {
                priority,
                updated_at: now,
                id,
            });
        self.jobs.write().insert(id, job);

        Ok(id)
    }

    async fn dequeue(&self, topic: &str, consumer: &str) -> QueueResult<Option<Job>> {
        // Lock order must match `requeue`'s (`jobs` then `pending`) or a
        // maintenance requeue and a dequeue racing on two threads can
        // deadlock on the reverse acquisition order.
        let mut jobs = self.jobs.write();
        let mut pending = self.pending.write();

        let heap = match pending.get_mut(topic) {
            Some(heap) => heap,
            None => return Ok(None),
        };

        let key = match heap.pop() {
            Some(key) => key,
            None => return Ok(None),
        };

        let job = jobs
            .get_mut(&key.id)
            .ok_or_else(|| QueueError::General(format!("dangling pending entry {}", key.id)))?;

        let now = Utc::now();
        job.status = JobStatus::Claimed;
        job.claimed_at = Some(now);
        job.claimed_by = Some(consumer.to_string());
        job.updated_at = now;

        Ok(Some(job.clone()))
    }

    async fn ack(&self, topic: &str, job_id: JobId, consumer: &str) -> QueueResult<()> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&job_id).ok_or(QueueError::NotPresent(job_id.0))?;

        if job.topic != topic {
            return Err(QueueError::NotPresent(job_id.0));
        }

        match job.status {
            JobStatus::Completed => return Err(QueueError::AlreadyAcked(job_id.0)),
            JobStatus::Pending => return Err(QueueError::LeaseExceeded(job_id.0)),
            JobStatus::Claimed => {}
        }

        if job.claimed_by.as_deref() != Some(consumer) {
            return Err(QueueError::WrongConsumer { job_id: job_id.0 });
        }

        let now = Utc::now();
        job.status = JobStatus::Completed;
        job.completed_at = Some(now);
        job.updated_at = now;

        Ok(())
    }

    async fn requeue(&self, topic: &str, cutoff: DateTime<Utc>) -> QueueResult<u64> {
        let mut jobs = self.jobs.write();
        let mut pending = self.pending.write();
        let now = Utc::now();
        let heap = pending.entry(topic.to_string()).or_default();

        let mut count = 0u64;
        for job in jobs.values_mut() {
            if job.topic != topic || job.status != JobStatus::Claimed {
                continue;
            }
            let Some(claimed_at) = job.claimed_at else {
                continue;
            };
            if claimed_at >= cutoff {
                continue;
            }

            job.status = JobStatus::Pending;
            job.claimed_at = None;
            job.claimed_by = None;
            job.updated_at = now;

            heap.push(PendingKey {
                priority: job.priority,
                updated_at: now,
                id: job.id,
            });
            count += 1;
        }

        Ok(count)
    }
}
