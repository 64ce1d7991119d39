use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use prio_queue::QueueError;

/// Wraps [`QueueError`] (plus request-decoding failures) for the HTTP
/// surface. 4xx for validation-like/domain errors, 5xx for coordination or
/// store failure, per the propagation policy.
pub struct ApiError(StatusCode, String);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        let status = match &err {
            QueueError::NotPresent(_) => StatusCode::NOT_FOUND,
            QueueError::UnknownTopic(_) => StatusCode::NOT_FOUND,
            QueueError::AlreadyExists(_) => StatusCode::CONFLICT,
            QueueError::AlreadyAcked(_) => StatusCode::CONFLICT,
            QueueError::LeaseExceeded(_) => StatusCode::CONFLICT,
            QueueError::WrongConsumer { .. } => StatusCode::FORBIDDEN,
            QueueError::NotAcquired(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueueError::General(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, err.to_string())
    }
}

impl From<base64::DecodeError> for ApiError {
    fn from(err: base64::DecodeError) -> Self {
        Self::bad_request(format!("invalid base64 payload: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}
