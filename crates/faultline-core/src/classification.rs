use std::error::Error;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::error::{ClassifiedError, DEFAULT_SYSTEM_MESSAGE, ErrorBody, FALLBACK_APP_CODE};

/// Any error recorded while handling a request or connection
///
/// Cheap to clone so it can sit in request and response extensions.
#[derive(Clone)]
pub struct RecordedError(Arc<dyn Error + Send + Sync + 'static>);

impl RecordedError {
    /// Wrap an error
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Wrap an error that is already shared
    pub fn from_shared(error: Arc<dyn Error + Send + Sync + 'static>) -> Self {
        Self(error)
    }

    /// Borrow the wrapped error
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }

    /// Shared handle to the wrapped error
    pub fn shared(&self) -> Arc<dyn Error + Send + Sync + 'static> {
        Arc::clone(&self.0)
    }

    /// Classify the wrapped error
    pub fn classify(&self) -> Classification<'_> {
        classify(self.as_error())
    }
}

impl<E> From<E> for RecordedError
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// Outcome of inspecting an error at the boundary
#[derive(Debug, Clone, Copy)]
pub enum Classification<'a> {
    /// Expected failure with a safe message and stable code
    Classified(&'a ClassifiedError),
    /// Anything else; its text must never reach a client
    Unclassified(&'a (dyn Error + 'static)),
}

/// Walk an error's source chain looking for a `ClassifiedError`
///
/// The first classified error found wins. When the chain holds none the
/// outermost error is reported as unclassified.
pub fn classify<'a>(error: &'a (dyn Error + 'static)) -> Classification<'a> {
    let mut current = Some(error);

    while let Some(err) = current {
        if let Some(classified) = err.downcast_ref::<ClassifiedError>() {
            return Classification::Classified(classified);
        }
        current = err.source();
    }

    Classification::Unclassified(error)
}

impl Classification<'_> {
    /// HTTP status to answer with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Classified(err) => err.status_code(),
            Self::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn app_code(&self) -> u32 {
        match self {
            Self::Classified(err) => err.app_code(),
            Self::Unclassified(_) => FALLBACK_APP_CODE,
        }
    }

    /// Message that is safe to expose to clients
    pub fn public_message(&self) -> &str {
        match self {
            Self::Classified(err) => err.message(),
            Self::Unclassified(_) => DEFAULT_SYSTEM_MESSAGE,
        }
    }

    /// Diagnostic description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Classified(err) => err.describe(),
            Self::Unclassified(err) => err.to_string(),
        }
    }

    pub const fn is_classified(&self) -> bool {
        matches!(self, Self::Classified(_))
    }

    /// Client-visible payload
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.public_message().to_string(),
            app_code: self.app_code(),
        }
    }
}
