use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use prio_coordination::CoordinationClient;
use prio_queue::{JobId, QueueBackend};

use super::dto::{
    decode_payload, AckRequest, AckResponse, DequeueRequest, DequeueResponse, EnqueueRequest,
    EnqueueResponse, RegisterTopicRequest, RegisterTopicResponse,
};
use super::error::ApiError;
use crate::worker::Worker;

/// `v1` HTTP surface fronting a [`Worker`]'s API façade. Generic over both
/// of the worker's seams so it can be mounted against either the in-memory
/// stack (tests) or the production coordination/postgres stack.
pub fn router<C, B>(worker: Arc<Worker<C, B>>) -> Router
where
    C: CoordinationClient + 'static,
    B: QueueBackend + 'static,
{
    Router::new()
        .route("/v1/topics", post(register_topic::<C, B>))
        .route("/v1/enqueue", post(enqueue::<C, B>))
        .route("/v1/dequeue", get(dequeue::<C, B>))
        .route("/v1/ack", post(ack::<C, B>))
        .with_state(worker)
        .layer(TraceLayer::new_for_http())
}

async fn register_topic<C, B>(
    State(worker): State<Arc<Worker<C, B>>>,
    Json(req): Json<RegisterTopicRequest>,
) -> Result<Json<RegisterTopicResponse>, ApiError>
where
    C: CoordinationClient + 'static,
    B: QueueBackend + 'static,
{
    worker.register_topic(&req.name, req.description).await?;
    Ok(Json(RegisterTopicResponse {}))
}

async fn enqueue<C, B>(
    State(worker): State<Arc<Worker<C, B>>>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>, ApiError>
where
    C: CoordinationClient + 'static,
    B: QueueBackend + 'static,
{
    let payload = decode_payload(&req.payload)?;
    let job_id = worker.enqueue(&req.topic, req.priority, payload).await?;
    Ok(Json(EnqueueResponse { job_id: job_id.as_i64() }))
}

async fn dequeue<C, B>(
    State(worker): State<Arc<Worker<C, B>>>,
    Json(req): Json<DequeueRequest>,
) -> Result<Json<DequeueResponse>, ApiError>
where
    C: CoordinationClient + 'static,
    B: QueueBackend + 'static,
{
    let job = worker.dequeue(&req.topic, &req.consumer).await?;
    Ok(Json(job.into()))
}

async fn ack<C, B>(
    State(worker): State<Arc<Worker<C, B>>>,
    Json(req): Json<AckRequest>,
) -> Result<Json<AckResponse>, ApiError>
where
    C: CoordinationClient + 'static,
    B: QueueBackend + 'static,
{
    worker.ack(&req.topic, JobId(req.job_id), &req.consumer).await?;
    Ok(Json(AckResponse { acked: true }))
}
