use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use faultline_core::{Classification, ClassifiedError, ErrorFrame, RecordedError};
use faultline_telemetry::{Fields, Logger};
use thiserror::Error;

/// Protocol marker attached to connection-level error logs
pub const PROTOCOL: &str = "websocket";

/// Write side of a persistent connection that can carry error frames
#[async_trait]
pub trait FrameSink: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver one frame to the peer
    async fn send_frame(&mut self, frame: &ErrorFrame) -> Result<(), Self::Error>;
}

/// Failure to deliver an error frame
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to encode error frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to send error frame: {0}")]
    Transport(#[from] axum::Error),
}

#[async_trait]
impl FrameSink for WebSocket {
    type Error = FrameError;

    async fn send_frame(&mut self, frame: &ErrorFrame) -> Result<(), Self::Error> {
        let text = serde_json::to_string(frame)?;
        self.send(Message::Text(text.into())).await?;
        Ok(())
    }
}

/// Report an error on an open connection
///
/// Does nothing for `None`. Unclassified errors are wrapped as system
/// errors so the client only ever sees a safe message and code. The error
/// is logged with its cause, then an error frame is sent. A failed send is
/// logged and otherwise dropped.
pub async fn report_channel_error<S>(logger: &Logger, sink: &mut S, error: Option<RecordedError>, fields: Fields)
where
    S: FrameSink + ?Sized,
{
    let Some(error) = error else {
        return;
    };

    let classified = match error.classify() {
        Classification::Classified(err) => err.clone(),
        Classification::Unclassified(_) => ClassifiedError::system("").with_shared_cause(error.shared()),
    };

    logger.error(
        classified.message(),
        Fields::new()
            .with("error", classified.describe())
            .with("app_code", classified.app_code())
            .merged(fields)
            .with("protocol", PROTOCOL),
    );

    if let Err(e) = sink.send_frame(&ErrorFrame::from(&classified)).await {
        logger.error(
            "failed to deliver error frame",
            Fields::new()
                .with("error", e.to_string())
                .with("app_code", classified.app_code())
                .with("protocol", PROTOCOL),
        );
    }
}
