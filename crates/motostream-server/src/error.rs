//! Error types for the motorcycle service.
//!
//! [`Error`] captures every reportable failure of the store, the service and
//! the stream emitter. [`ApiError`] adapts it to an HTTP response so handlers
//! can propagate with `?`.
//!
//! ## Error Cases
//! - `NotFound`: The requested identifier is not in the store.
//! - `StreamFailure`: The record source failed while a stream was emitting.
//! - `StreamCancelled`: The stream was cancelled through its handle or by
//!   shutdown.
//! - `SubscriberGone`: The subscriber detached before the stream ended.
//! - `ServiceShutdown`: A request arrived while the service was shutting down.
//! - `InvalidDataset`: A dataset was rejected before being loaded.
//! - `ShutdownTimedOut`: Streams were still running when the drain deadline
//!   passed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use motostream_core::types::{ErrorBody, MotorcycleId};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Motorcycle {id} not found")]
    NotFound { id: MotorcycleId },

    #[error("Stream failed: {reason}")]
    StreamFailure { reason: String },

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Subscriber disconnected")]
    SubscriberGone,

    #[error("Service is shutting down")]
    ServiceShutdown,

    #[error("Invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("Shutdown timed out with {in_flight} streams still running")]
    ShutdownTimedOut { in_flight: usize },
}

impl Error {
    pub fn not_found(id: &MotorcycleId) -> Self {
        Self::NotFound { id: id.clone() }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
            Self::StreamFailure { .. }
            | Self::StreamCancelled
            | Self::SubscriberGone
            | Self::InvalidDataset { .. }
            | Self::ShutdownTimedOut { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP-facing wrapper around [`Error`].
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}
