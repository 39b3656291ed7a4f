//! Handlers exercising each error path

use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use faultline_core::{ClassifiedError, RecordedError};
use faultline_server::{ErrorSlot, HandlerError, report_channel_error};
use faultline_telemetry::{Fields, Logger};

/// Routes used across the integration suites
pub fn demo_routes() -> Router {
    Router::new()
        .route("/users/{id}", get(get_user))
        .route("/boom", get(boom))
        .route("/ok", get(|| async { (StatusCode::CREATED, "made") }))
        .route("/echo", post(echo_len))
        .route("/multi", get(multi))
}

/// WebSocket routes that report a failure as soon as the socket opens
///
/// `/ws/boom` reports an unclassified error, `/ws/denied` a classified one.
pub fn channel_routes(logger: Logger) -> Router {
    let denied_logger = logger.clone();
    Router::new()
        .route(
            "/ws/boom",
            get(move |ws: WebSocketUpgrade| async move {
                report_on_open(ws, logger, RecordedError::new(std::io::Error::other("socket parser exploded")))
            }),
        )
        .route(
            "/ws/denied",
            get(move |ws: WebSocketUpgrade| async move {
                report_on_open(
                    ws,
                    denied_logger,
                    ClassifiedError::unauthorized(3001, "session expired").into(),
                )
            }),
        )
}

fn report_on_open(ws: WebSocketUpgrade, logger: Logger, error: RecordedError) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        report_channel_error(&logger, &mut socket, Some(error), Fields::new().with("path", "/ws")).await;
    })
}

async fn get_user(Path(id): Path<String>) -> Result<String, HandlerError> {
    let id: u64 = id.parse().map_err(|e: std::num::ParseIntError| {
        ClassifiedError::bad_request(1001, "bad id").with_cause(std::io::Error::other(format!("db failure: {e}")))
    })?;
    Ok(format!("user {id}"))
}

async fn boom() -> Result<(), HandlerError> {
    Err(std::io::Error::other("boom").into())
}

async fn echo_len(body: Bytes) -> String {
    body.len().to_string()
}

async fn multi(slot: ErrorSlot) -> &'static str {
    slot.push(std::io::Error::other("cache miss"));
    slot.push(ClassifiedError::not_found(2004, "no such item"));
    "handler body"
}
