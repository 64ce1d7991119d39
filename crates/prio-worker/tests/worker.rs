use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use prio_coordination::{CoordinationClient, InMemoryClient};
use prio_queue::{MemoryBackend, QueueEngine};
use prio_worker::{http, Worker};

async fn wait_until<F, Fut>(condition: F, timeout: Duration)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition().await {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition never became true within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn new_worker(
    client: &Arc<InMemoryClient>,
    namespace: &str,
    id: &str,
) -> Arc<Worker<InMemoryClient, MemoryBackend>> {
    let engine = Arc::new(QueueEngine::new(MemoryBackend::new()));
    Worker::new(Arc::clone(client), engine, namespace, id)
}

#[tokio::test]
async fn sole_worker_becomes_leader_and_claims_all_topics() {
    let client = Arc::new(InMemoryClient::new());
    let worker = new_worker(&client, "prio-test", "worker-a");

    worker.register_topic("alerts", None).await.unwrap();
    worker.register_topic("billing", None).await.unwrap();

    let _supervisor = worker.start().await.unwrap();
    wait_until(|| worker.is_leader(), Duration::from_secs(2)).await;

    wait_until(
        || async { !client.get("/prio-test/partition").await.unwrap().is_empty() },
        Duration::from_secs(2),
    )
    .await;

    let doc = client.get("/prio-test/partition").await.unwrap();
    let assignment: HashMap<String, HashSet<String>> = serde_json::from_slice(&doc).unwrap();
    let topics = assignment.get("worker-a").expect("sole worker owns every topic");
    assert_eq!(topics.len(), 2);
    assert!(topics.contains("alerts"));
    assert!(topics.contains("billing"));
}

#[tokio::test]
async fn a_new_member_triggers_rebalance() {
    let client = Arc::new(InMemoryClient::new());
    let worker = new_worker(&client, "prio-test", "worker-a");
    worker.register_topic("alerts", None).await.unwrap();
    worker.register_topic("billing", None).await.unwrap();
    worker.register_topic("receipts", None).await.unwrap();

    let _supervisor = worker.start().await.unwrap();
    wait_until(|| worker.is_leader(), Duration::from_secs(2)).await;

    // Simulate a second worker joining the namespace without running its own
    // supervisor loop: dropping an ephemeral member node is enough to fire
    // worker-a's members watch and force it to recompute the partition.
    client
        .create_ephemeral("/prio-test/members/worker-b", vec![])
        .await
        .unwrap();

    wait_until(
        || async {
            let doc = client.get("/prio-test/partition").await.unwrap();
            let assignment: HashMap<String, HashSet<String>> = serde_json::from_slice(&doc).unwrap();
            assignment.contains_key("worker-b")
        },
        Duration::from_secs(2),
    )
    .await;

    let doc = client.get("/prio-test/partition").await.unwrap();
    let assignment: HashMap<String, HashSet<String>> = serde_json::from_slice(&doc).unwrap();
    let mut topics: Vec<String> = assignment.values().flatten().cloned().collect();
    topics.sort();
    assert_eq!(topics, vec!["alerts", "billing", "receipts"]);
    assert!(!assignment["worker-a"].is_empty());
    assert!(!assignment["worker-b"].is_empty());
}

#[tokio::test]
async fn expired_claim_is_reclaimed_by_the_maintenance_tick() {
    let client = Arc::new(InMemoryClient::new());
    let worker = new_worker(&client, "prio-test", "worker-a");
    worker.register_topic("alerts", None).await.unwrap();
    let job_id = worker.enqueue("alerts", 5, b"payload".to_vec()).await.unwrap();

    let _supervisor = worker.start().await.unwrap();
    wait_until(|| worker.is_leader(), Duration::from_secs(2)).await;

    let claimed = worker.dequeue("alerts", "consumer-1").await.unwrap().unwrap();
    assert_eq!(claimed.id, job_id);
    assert!(worker.dequeue("alerts", "consumer-2").await.unwrap().is_none());

    // LEASE is 10s and MAINTENANCE_TICK is 5s; wait past both so the
    // maintenance loop has a chance to notice the expired claim.
    tokio::time::sleep(Duration::from_secs(16)).await;

    let reclaimed = worker
        .dequeue("alerts", "consumer-2")
        .await
        .unwrap()
        .expect("lease should have expired and been requeued");
    assert_eq!(reclaimed.id, job_id);
}

#[tokio::test]
async fn http_surface_round_trips_a_job() {
    let client = Arc::new(InMemoryClient::new());
    let worker = new_worker(&client, "prio-test", "worker-a");
    let _supervisor = worker.start().await.unwrap();
    wait_until(|| worker.is_leader(), Duration::from_secs(2)).await;

    let app = http::router(Arc::clone(&worker));

    let res = app
        .clone()
        .oneshot(json_request("POST", "/v1/topics", json!({"name": "alerts"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/enqueue",
            json!({"topic": "alerts", "priority": 7, "payload": base64_encode(b"hello")}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let job_id = body["job_id"].as_i64().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/v1/dequeue",
            json!({"topic": "alerts", "consumer": "consumer-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["job_id"].as_i64().unwrap(), job_id);
    assert_eq!(body["payload"].as_str().unwrap(), base64_encode(b"hello"));

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/ack",
            json!({"topic": "alerts", "job_id": job_id, "consumer": "consumer-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["acked"], true);

    // Acking twice surfaces the domain conflict as 409, not a panic.
    let res = app
        .oneshot(json_request(
            "POST",
            "/v1/ack",
            json!({"topic": "alerts", "job_id": job_id, "consumer": "consumer-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}
