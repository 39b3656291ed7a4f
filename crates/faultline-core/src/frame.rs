use serde::Serialize;

use crate::classification::Classification;
use crate::error::ClassifiedError;

/// Error message pushed to a client over a persistent connection
///
/// Serializes as `{"type":"error","message":..,"app_code":..}`. The
/// `type` tag lets clients tell error frames apart from regular traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorFrame {
    r#type: &'static str,
    pub message: String,
    pub app_code: u32,
}

impl ErrorFrame {
    pub const TYPE: &'static str = "error";

    pub fn new(message: impl Into<String>, app_code: u32) -> Self {
        Self {
            r#type: Self::TYPE,
            message: message.into(),
            app_code,
        }
    }
}

impl From<&ClassifiedError> for ErrorFrame {
    fn from(err: &ClassifiedError) -> Self {
        Self::new(err.message(), err.app_code())
    }
}

impl From<Classification<'_>> for ErrorFrame {
    fn from(classification: Classification<'_>) -> Self {
        Self::new(classification.public_message(), classification.app_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_tagged() {
        let err = ClassifiedError::bad_request(1001, "bad id").with_cause(std::io::Error::other("db failure"));
        let json = serde_json::to_value(ErrorFrame::from(&err)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"type": "error", "message": "bad id", "app_code": 1001})
        );
    }

    #[test]
    fn unclassified_frame_uses_fallback() {
        let err = std::io::Error::other("boom");
        let frame = ErrorFrame::from(crate::classify(&err));

        assert_eq!(frame, ErrorFrame::new("Internal Server Error", 9000));
    }
}
