//! Route table of the HTTP surface.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/motorcycle/{id}` | JSON motorcycle |
//! | GET | `/motorcycle/{id}/specification` | JSON specification |
//! | GET | `/motorcycles/stream` | `application/json+stream`, one motorcycle per line |

use crate::{
    error::{ApiError, Error},
    service::handler::MotorcycleService,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::StreamExt;
use motostream_core::{
    codec::encode_line,
    routes::{MOTORCYCLE_ROUTE, SPECIFICATION_ROUTE, STREAM_CONTENT_TYPE, STREAM_ROUTE},
    types::{Motorcycle, MotorcycleId, Specification},
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builds the router for `service`.
pub fn router(service: MotorcycleService) -> Router {
    Router::new()
        .route(MOTORCYCLE_ROUTE, get(get_motorcycle))
        .route(SPECIFICATION_ROUTE, get(get_specification))
        .route(STREAM_ROUTE, get(stream_motorcycles))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves `service` on `listener` until `shutdown` resolves.
///
/// In-flight responses, open streams included, are allowed to finish after
/// `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    service: MotorcycleService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_motorcycle(
    State(service): State<MotorcycleService>,
    Path(id): Path<MotorcycleId>,
) -> Result<Json<Motorcycle>, ApiError> {
    Ok(Json(service.fetch_motorcycle(&id).await?))
}

async fn get_specification(
    State(service): State<MotorcycleService>,
    Path(id): Path<MotorcycleId>,
) -> Result<Json<Specification>, ApiError> {
    Ok(Json(service.fetch_specification(&id).await?))
}

async fn stream_motorcycles(
    State(service): State<MotorcycleService>,
) -> Result<Response, ApiError> {
    let handle = service.stream_all()?;
    let stream_id = handle.id();

    // An `Err` item aborts the chunked body, so the subscriber sees a broken
    // transfer instead of a clean end of stream.
    let body = handle.map(move |event| match event {
        Ok(moto) => encode_line(&moto).map_err(|e| Error::StreamFailure {
            reason: e.to_string(),
        }),
        Err(e) => {
            tracing::warn!(stream_id, "Aborting response body: {e}");
            Err(e)
        }
    });

    Ok((
        [(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)],
        Body::from_stream(body),
    )
        .into_response())
}
