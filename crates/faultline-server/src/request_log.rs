use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use faultline_config::{ClientIpConfig, RequestLogConfig};
use faultline_core::RecordedError;
use faultline_telemetry::{Fields, Logger};
use http::{HeaderMap, header};
use http_body::Body as _;
use serde_json::{Map, Value};

use crate::capture::capture_prefix;
use crate::client_ip;
use crate::errors::ErrorSlot;

/// Value logged in place of a redacted header
pub const REDACTED: &str = "[redacted]";

/// Shared configuration for [`request_log`]
#[derive(Debug, Clone)]
pub struct RequestLogState {
    logger: Logger,
    config: Arc<RequestLogConfig>,
    client_ip: Arc<ClientIpConfig>,
}

impl RequestLogState {
    pub fn new(logger: Logger, config: RequestLogConfig, client_ip: ClientIpConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
            client_ip: Arc::new(client_ip),
        }
    }
}

/// Middleware emitting exactly one structured record per request
///
/// Copies a bounded prefix of the request body for the record while
/// leaving the full body readable downstream. The record is written at
/// error level when any error was recorded for the request, and at info
/// level otherwise.
pub async fn request_log(state: RequestLogState, request: Request, next: Next) -> Response {
    let start = Instant::now();

    let (parts, body) = request.into_parts();
    let (body_prefix, body) = if body.is_end_stream() {
        (Bytes::new(), body)
    } else {
        let captured = capture_prefix(body, state.config.body_limit).await;
        (captured.prefix, captured.body)
    };

    let mut request = Request::from_parts(parts, body);
    let slot = ErrorSlot::ensure(&mut request);
    let fields = request_fields(&state, &request);

    let mut response = next.run(request).await;
    slot.absorb(&mut response);

    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let fields = fields
        .with("status_code", response.status().as_u16())
        .with("latency_ms", latency_ms)
        .with("request_body", logged_body(&body_prefix, state.config.body_limit));

    let errors = slot.snapshot();
    match errors.last() {
        Some(last) => {
            let classification = last.classify();
            let outcome = if classification.is_classified() {
                "classified_error"
            } else {
                "unclassified_error"
            };

            state.logger.error(
                &describe_all(&errors),
                fields
                    .with("error", classification.describe())
                    .with("app_code", classification.app_code())
                    .with("outcome", outcome),
            );
        }
        None => state.logger.info("request processed", fields.with("outcome", "ok")),
    }

    response
}

fn request_fields(state: &RequestLogState, request: &Request) -> Fields {
    let uri = request.uri();
    let headers = request.headers();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let mut fields = Fields::new()
        .with("method", request.method().as_str())
        .with("path", uri.path())
        .with_opt("query", uri.query().filter(|q| !q.is_empty()))
        .with(
            "client_ip",
            client_ip::resolve(headers, request.extensions(), &state.client_ip),
        )
        .with("user_agent", user_agent);

    if state.config.log_headers {
        let map = header_map(headers, &state.config.redacted_headers);
        if !map.is_empty() {
            fields.insert("headers", map);
        }
    }

    if state.config.log_cookies {
        let map = cookie_map(headers);
        if !map.is_empty() {
            fields.insert("cookies", map);
        }
    }

    fields
}

/// Request headers as a flat object; repeated headers are comma-joined
fn header_map(headers: &HeaderMap, redacted: &[String]) -> Map<String, Value> {
    let mut map = Map::new();

    for name in headers.keys() {
        // Reported separately as the cookie map
        if name == header::COOKIE {
            continue;
        }

        let value = if redacted.iter().any(|r| name.as_str().eq_ignore_ascii_case(r)) {
            REDACTED.to_string()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };

        map.insert(name.as_str().to_string(), Value::from(value));
    }

    map
}

fn cookie_map(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), Value::from(value.trim())))
        .collect()
}

/// Body prefix as text of at most `limit` bytes
///
/// Invalid UTF-8 is replaced with U+FFFD, which can grow the text past the
/// captured length, so the result is cut again at a character boundary.
fn logged_body(prefix: &[u8], limit: usize) -> String {
    let mut text = String::from_utf8_lossy(prefix).into_owned();
    if text.len() > limit {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Numbered, newline-separated descriptions of every recorded error
fn describe_all(errors: &[RecordedError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, error)| format!("Error #{:02}: {}", i + 1, error.classify().describe()))
        .collect::<Vec<_>>()
        .join("\n")
}
