use axum::Json;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faultline_core::Classification;
use faultline_telemetry::{Fields, Logger};

use crate::errors::ErrorSlot;

/// Marker set on responses written by the error boundary
///
/// Once present, the response is final and later stages must not replace it.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCommitted;

/// Middleware converting a request's recorded errors into its response
///
/// Runs the rest of the chain first. When no error was recorded the
/// handler's response passes through untouched. Otherwise only the last
/// recorded error decides the outcome: a classified error answers with
/// its own status and `{message, app_code}`, anything else with a fixed
/// 500 payload. Either way the diagnostic detail goes to the log and
/// never into the body.
pub async fn error_boundary(logger: Logger, mut request: Request, next: Next) -> Response {
    let slot = ErrorSlot::ensure(&mut request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    slot.absorb(&mut response);

    let errors = slot.snapshot();
    let Some((last, earlier)) = errors.split_last() else {
        return response;
    };

    for (index, error) in earlier.iter().enumerate() {
        logger.debug(
            "superseded error",
            Fields::new()
                .with("error", error.classify().describe())
                .with("index", index)
                .with("path", path.as_str())
                .with("method", method.as_str()),
        );
    }

    let classification = last.classify();
    let fields = Fields::new()
        .with("error", classification.describe())
        .with("path", path)
        .with("method", method.as_str())
        .with("app_code", classification.app_code());

    match classification {
        Classification::Classified(err) => logger.error(err.message(), fields),
        Classification::Unclassified(_) => logger.error("unhandled internal error", fields),
    }

    let mut response = (classification.status(), Json(classification.body())).into_response();
    response.extensions_mut().insert(ResponseCommitted);
    response
}
