//! `v1` HTTP façade over a [`crate::worker::Worker`]. Request tracing and
//! error-to-status mapping live here; domain logic stays in the worker's
//! API façade and `prio-queue` underneath it.

mod dto;
mod error;
mod routes;

pub use routes::router;
