use base64::Engine;
use serde::{Deserialize, Serialize};

use prio_queue::Job;

#[derive(Debug, Deserialize)]
pub struct RegisterTopicRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterTopicResponse {}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub topic: String,
    pub priority: i32,
    /// Base64-encoded payload bytes.
    pub payload: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DequeueRequest {
    pub topic: String,
    pub consumer: String,
}

#[derive(Debug, Serialize, Default)]
pub struct DequeueResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl From<Option<Job>> for DequeueResponse {
    fn from(job: Option<Job>) -> Self {
        match job {
            None => Self::default(),
            Some(job) => Self {
                job_id: Some(job.id.as_i64()),
                topic: Some(job.topic),
                payload: Some(base64::engine::general_purpose::STANDARD.encode(job.payload)),
                priority: Some(job.priority),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub topic: String,
    pub job_id: i64,
    pub consumer: String,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub acked: bool,
}

/// Decodes an [`EnqueueRequest`]'s base64 payload. Separated from the
/// handler so the bad-payload error maps to the same 4xx path as any other
/// validation error.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(payload)
}
