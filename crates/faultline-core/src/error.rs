use std::error::Error;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

/// App code reported for every `ClassifiedError::system` error
pub const SYSTEM_ERROR_APP_CODE: u32 = 9000;

/// App code reported when the boundary meets an error it cannot classify
pub const FALLBACK_APP_CODE: u32 = 9000;

/// Public message for system and unclassified errors
pub const DEFAULT_SYSTEM_MESSAGE: &str = "Internal Server Error";

pub const DEFAULT_BAD_REQUEST_MESSAGE: &str = "Invalid request";

pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "Not found";

pub const DEFAULT_UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Shared handle to an underlying error
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// A failure that has been recognised as actionable and is safe to show
///
/// Carries a client-safe message, a stable machine-readable app code and
/// the HTTP status to answer with. The optional cause is kept for
/// diagnostics only: it never reaches a serialized payload, and neither
/// does the HTTP status.
///
/// Values are immutable. A cause can only be attached while building,
/// through the consuming [`ClassifiedError::with_cause`].
#[derive(Clone, Serialize)]
pub struct ClassifiedError {
    #[serde(skip)]
    cause: Option<Cause>,
    message: String,
    #[serde(skip)]
    http_status: u16,
    app_code: u32,
}

impl ClassifiedError {
    /// Build an error with full control over status, code and message
    ///
    /// No defaulting or validation is applied.
    pub fn new(http_status: u16, app_code: u32, message: impl Into<String>) -> Self {
        Self {
            cause: None,
            message: message.into(),
            http_status,
            app_code,
        }
    }

    /// Internal failure (500) with the generic system app code
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            SYSTEM_ERROR_APP_CODE,
            or_default(message.into(), DEFAULT_SYSTEM_MESSAGE),
        )
    }

    /// Rejected input (400)
    pub fn bad_request(app_code: u32, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST.as_u16(),
            app_code,
            or_default(message.into(), DEFAULT_BAD_REQUEST_MESSAGE),
        )
    }

    /// Missing resource (404)
    pub fn not_found(app_code: u32, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND.as_u16(),
            app_code,
            or_default(message.into(), DEFAULT_NOT_FOUND_MESSAGE),
        )
    }

    /// Missing or invalid credentials (401)
    pub fn unauthorized(app_code: u32, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED.as_u16(),
            app_code,
            or_default(message.into(), DEFAULT_UNAUTHORIZED_MESSAGE),
        )
    }

    /// Caller-chosen status and code, message taken as-is
    pub fn custom(http_status: u16, app_code: u32, message: impl Into<String>) -> Self {
        Self::new(http_status, app_code, message)
    }

    /// Attach the underlying error that triggered this one
    #[must_use]
    pub fn with_cause<E>(self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.with_shared_cause(Arc::new(cause))
    }

    /// Attach an already shared underlying error
    #[must_use]
    pub fn with_shared_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Message safe for client display
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stable client-facing code
    pub const fn app_code(&self) -> u32 {
        self.app_code
    }

    /// Raw HTTP status as constructed
    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    /// HTTP status to answer with
    ///
    /// Values outside the valid status range fall back to 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The wrapped error, if any
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Diagnostic text: the cause's description, or the public message
    ///
    /// Meant for logs only, never for a response body.
    pub fn describe(&self) -> String {
        self.cause
            .as_ref()
            .map_or_else(|| self.message.clone(), ToString::to_string)
    }

    /// Client-visible payload
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message.clone(),
            app_code: self.app_code,
        }
    }
}

fn or_default(message: String, default: &str) -> String {
    if message.is_empty() { default.to_string() } else { message }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => fmt::Display::fmt(cause, f),
            None => f.write_str(&self.message),
        }
    }
}

// Hand-written so the cause only shows up as its description
impl fmt::Debug for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedError")
            .field("message", &self.message)
            .field("http_status", &self.http_status)
            .field("app_code", &self.app_code)
            .field("cause", &self.cause.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

/// JSON body sent to HTTP clients for any error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub app_code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(value: &serde_json::Value) -> Vec<String> {
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn serializes_only_message_and_app_code() {
        let constructed = [
            ClassifiedError::system("db down").with_cause(std::io::Error::other("secret dsn")),
            ClassifiedError::system(""),
            ClassifiedError::bad_request(1001, "bad id").with_cause(std::io::Error::other("db failure")),
            ClassifiedError::not_found(2004, ""),
            ClassifiedError::unauthorized(3001, "").with_cause(std::io::Error::other("expired token")),
            ClassifiedError::custom(418, 4180, "teapot"),
            ClassifiedError::new(503, 7, "later").with_cause(std::io::Error::other("upstream")),
        ];

        for err in constructed {
            let value = serde_json::to_value(&err).unwrap();
            assert_eq!(keys(&value), ["app_code", "message"]);
            assert_eq!(value["message"], err.message());
            assert_eq!(value["app_code"], err.app_code());
            assert_eq!(serde_json::to_value(err.body()).unwrap(), value);
        }
    }

    #[test]
    fn system_error_hides_cause() {
        let err = ClassifiedError::system("").with_cause(std::io::Error::other("secret database error"));
        let json = serde_json::to_string(&err).unwrap();

        assert_eq!(json, r#"{"message":"Internal Server Error","app_code":9000}"#);
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn constructors_default_empty_messages() {
        assert_eq!(ClassifiedError::system("").message(), DEFAULT_SYSTEM_MESSAGE);
        assert_eq!(ClassifiedError::bad_request(1, "").message(), DEFAULT_BAD_REQUEST_MESSAGE);
        assert_eq!(ClassifiedError::not_found(1, "").message(), DEFAULT_NOT_FOUND_MESSAGE);
        assert_eq!(ClassifiedError::unauthorized(1, "").message(), DEFAULT_UNAUTHORIZED_MESSAGE);
        assert_eq!(ClassifiedError::custom(409, 1, "").message(), "");
        assert_eq!(ClassifiedError::new(409, 1, "").message(), "");
    }

    #[test]
    fn constructors_set_status_and_code() {
        let err = ClassifiedError::bad_request(1001, "bad id");
        assert_eq!((err.http_status(), err.app_code()), (400, 1001));

        let err = ClassifiedError::not_found(1404, "gone");
        assert_eq!((err.http_status(), err.app_code()), (404, 1404));

        let err = ClassifiedError::unauthorized(1401, "who");
        assert_eq!((err.http_status(), err.app_code()), (401, 1401));

        let err = ClassifiedError::system("boom");
        assert_eq!((err.http_status(), err.app_code()), (500, SYSTEM_ERROR_APP_CODE));
    }

    #[test]
    fn describe_prefers_cause() {
        let err = ClassifiedError::bad_request(1001, "bad id").with_cause(std::io::Error::other("db failure"));
        assert_eq!(err.describe(), "db failure");
        assert_eq!(err.to_string(), "db failure");
        assert_eq!(err.message(), "bad id");
    }

    #[test]
    fn describe_falls_back_to_message() {
        let err = ClassifiedError::bad_request(1001, "bad id");
        assert_eq!(err.describe(), "bad id");
        assert_eq!(err.to_string(), "bad id");
    }

    #[test]
    fn unwraps_to_cause_in_one_step() {
        let err = ClassifiedError::system("").with_cause(std::io::Error::other("disk full"));

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "disk full");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
        assert!(source.source().is_none());
        assert_eq!(err.cause().unwrap().to_string(), "disk full");
    }

    #[test]
    fn unwrap_without_cause_is_none() {
        let err = ClassifiedError::not_found(1, "nope");
        assert!(err.source().is_none());
        assert!(err.cause().is_none());
    }

    #[test]
    fn invalid_status_falls_back_to_500() {
        let err = ClassifiedError::custom(42, 1, "odd");
        assert_eq!(err.http_status(), 42);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
