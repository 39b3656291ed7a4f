use std::convert::Infallible;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{FromRequestParts, Request};
use axum::response::{IntoResponse, Response};
use faultline_core::RecordedError;
use http::StatusCode;
use http::request::Parts;

/// Errors recorded while a single request is handled
///
/// Installed in the request extensions by the outermost Faultline
/// middleware and shared by every later stage. Handlers obtain it as an
/// extractor when they want to record an error but still write their own
/// response. Outside the middleware stack the extractor yields a detached,
/// empty slot.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot(Arc<Mutex<Vec<RecordedError>>>);

impl ErrorSlot {
    /// Return the request's slot, installing one if none exists yet
    pub fn ensure(request: &mut Request) -> Self {
        if let Some(slot) = request.extensions().get::<Self>() {
            return slot.clone();
        }

        let slot = Self::default();
        request.extensions_mut().insert(slot.clone());
        slot
    }

    /// Record an error
    pub fn push(&self, error: impl Into<RecordedError>) {
        self.errors().push(error.into());
    }

    /// The most recently recorded error
    pub fn last(&self) -> Option<RecordedError> {
        self.errors().last().cloned()
    }

    /// All recorded errors, oldest first
    pub fn snapshot(&self) -> Vec<RecordedError> {
        self.errors().clone()
    }

    pub fn len(&self) -> usize {
        self.errors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors().is_empty()
    }

    /// Move an error returned by the handler into the slot
    pub(crate) fn absorb(&self, response: &mut Response) {
        if let Some(HandlerError(error)) = response.extensions_mut().remove::<HandlerError>() {
            self.push(error);
        }
    }

    fn errors(&self) -> std::sync::MutexGuard<'_, Vec<RecordedError>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> FromRequestParts<S> for ErrorSlot
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

/// Error returned from a handler
///
/// Lets handlers use `Result<T, HandlerError>` and `?`. The response it
/// produces is only a placeholder: the error travels in the response
/// extensions until the error boundary turns it into the final response.
#[derive(Debug, Clone)]
pub struct HandlerError(RecordedError);

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(RecordedError::new(error))
    }

    pub const fn recorded(&self) -> &RecordedError {
        &self.0
    }
}

impl<E> From<E> for HandlerError
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
