use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use prio_queue::backend::QueueBackend;
use prio_queue::{JobStatus, MemoryBackend, QueueError};

async fn seeded_backend(topic: &str) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.register_topic(topic, None).await.unwrap();
    backend
}

#[tokio::test]
async fn dequeue_returns_none_on_empty_topic() {
    let backend = seeded_backend("jobs").await;
    let job = backend.dequeue("jobs", "worker-1").await.unwrap();
    assert!(job.is_none());
}

#[tokio::test]
async fn enqueue_on_unknown_topic_is_rejected() {
    let backend = MemoryBackend::new();
    let err = backend.enqueue("ghost", 5, b"payload".to_vec()).await.unwrap_err();
    assert!(matches!(err, QueueError::UnknownTopic(t) if t == "ghost"));
}

#[tokio::test]
async fn dequeue_claims_highest_priority_first() {
    let backend = seeded_backend("jobs").await;
    let low = backend.enqueue("jobs", 1, b"low".to_vec()).await.unwrap();
    let high = backend.enqueue("jobs", 9, b"high".to_vec()).await.unwrap();
    let _mid = backend.enqueue("jobs", 5, b"mid".to_vec()).await.unwrap();

    let job = backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();
    assert_eq!(job.id, high);
    assert_ne!(job.id, low);
    assert_eq!(job.status, JobStatus::Claimed);
    assert_eq!(job.claimed_by.as_deref(), Some("worker-1"));
    assert!(job.claimed_at.is_some());
}

#[tokio::test]
async fn dequeue_breaks_priority_ties_by_oldest_update() {
    let backend = seeded_backend("jobs").await;
    let first = backend.enqueue("jobs", 5, b"first".to_vec()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let _second = backend.enqueue("jobs", 5, b"second".to_vec()).await.unwrap();

    let job = backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();
    assert_eq!(job.id, first);
}

#[tokio::test]
async fn each_job_is_claimed_by_exactly_one_consumer() {
    let backend = seeded_backend("jobs").await;
    backend.enqueue("jobs", 1, b"only".to_vec()).await.unwrap();

    let first = backend.dequeue("jobs", "worker-1").await.unwrap();
    let second = backend.dequeue("jobs", "worker-2").await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
}

#[tokio::test]
async fn ack_by_claim_holder_completes_the_job() {
    let backend = seeded_backend("jobs").await;
    let id = backend.enqueue("jobs", 1, b"payload".to_vec()).await.unwrap();
    backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();

    backend.ack("jobs", id, "worker-1").await.unwrap();

    let err = backend.ack("jobs", id, "worker-1").await.unwrap_err();
    assert!(matches!(err, QueueError::AlreadyAcked(job_id) if job_id == id.as_i64()));
}

#[tokio::test]
async fn ack_by_wrong_consumer_is_rejected() {
    let backend = seeded_backend("jobs").await;
    let id = backend.enqueue("jobs", 1, b"payload".to_vec()).await.unwrap();
    backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();

    let err = backend.ack("jobs", id, "worker-2").await.unwrap_err();
    assert!(matches!(err, QueueError::WrongConsumer { job_id } if job_id == id.as_i64()));
}

#[tokio::test]
async fn ack_of_pending_job_reports_lease_exceeded() {
    let backend = seeded_backend("jobs").await;
    let id = backend.enqueue("jobs", 1, b"payload".to_vec()).await.unwrap();

    let err = backend.ack("jobs", id, "worker-1").await.unwrap_err();
    assert!(matches!(err, QueueError::LeaseExceeded(job_id) if job_id == id.as_i64()));
}

#[tokio::test]
async fn requeue_returns_expired_claims_to_pending() {
    let backend = seeded_backend("jobs").await;
    let id = backend.enqueue("jobs", 1, b"payload".to_vec()).await.unwrap();
    backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();

    let future_cutoff = Utc::now() + chrono::Duration::seconds(60);
    let requeued = backend.requeue("jobs", future_cutoff).await.unwrap();
    assert_eq!(requeued, 1);

    let job = backend.dequeue("jobs", "worker-2").await.unwrap().unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.claimed_by.as_deref(), Some("worker-2"));
}

#[tokio::test]
async fn requeue_leaves_fresh_claims_untouched() {
    let backend = seeded_backend("jobs").await;
    backend.enqueue("jobs", 1, b"payload".to_vec()).await.unwrap();
    backend.dequeue("jobs", "worker-1").await.unwrap().unwrap();

    let past_cutoff = Utc::now() - chrono::Duration::seconds(60);
    let requeued = backend.requeue("jobs", past_cutoff).await.unwrap();
    assert_eq!(requeued, 0);
}

#[tokio::test]
async fn registering_a_topic_twice_is_rejected() {
    let backend = seeded_backend("jobs").await;
    let err = backend.register_topic("jobs", None).await.unwrap_err();
    assert!(matches!(err, QueueError::AlreadyExists(t) if t == "jobs"));
}

#[tokio::test]
async fn get_topics_lists_every_registered_name() {
    let backend = MemoryBackend::new();
    backend.register_topic("alpha", None).await.unwrap();
    backend.register_topic("beta", None).await.unwrap();

    let mut topics = backend.get_topics().await.unwrap();
    topics.sort();
    assert_eq!(topics, vec!["alpha".to_string(), "beta".to_string()]);
}

#[tokio::test]
async fn draining_a_hundred_random_priorities_matches_descending_sort() {
    let backend = seeded_backend("firehose").await;

    let mut rng = rand::thread_rng();
    let mut priorities: Vec<i32> = (0..100).map(|_| rng.gen_range(0..100)).collect();
    for priority in &priorities {
        backend.enqueue("firehose", *priority, b"x".to_vec()).await.unwrap();
    }

    let mut drained = Vec::with_capacity(priorities.len());
    while let Some(job) = backend.dequeue("firehose", "drainer").await.unwrap() {
        drained.push(job.priority);
    }

    // `sort_by` is a stable sort, so ties keep their enqueue order — matching
    // the tie-break rule the heap itself uses.
    priorities.sort_by(|a, b| b.cmp(a));
    assert_eq!(drained, priorities);
}
