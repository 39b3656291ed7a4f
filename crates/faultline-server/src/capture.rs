use axum::body::{Body, Bytes};
use bytes::BytesMut;
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;

/// Request body split into a logged prefix and a replayable stream
pub struct CapturedBody {
    /// At most `limit` leading bytes of the body
    pub prefix: Bytes,
    /// Complete body for downstream handlers
    pub body: Body,
}

/// Copy up to `limit` leading bytes of `body` without consuming it
///
/// Frames are read until at least `limit` bytes are buffered or the body
/// ends. The returned body yields the buffered bytes and then whatever
/// the original stream still holds, so handlers observe the full,
/// unmodified payload. A read error is replayed to the handler at the
/// point it occurred. Trailers are not preserved.
pub async fn capture_prefix(mut body: Body, limit: usize) -> CapturedBody {
    let mut buffered = BytesMut::new();
    let mut read_error = None;
    let mut finished = false;

    while buffered.len() < limit {
        match body.frame().await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    buffered.extend_from_slice(&data);
                }
            }
            Some(Err(e)) => {
                read_error = Some(e);
                break;
            }
            None => {
                finished = true;
                break;
            }
        }
    }

    let buffered = buffered.freeze();
    let prefix = buffered.slice(..buffered.len().min(limit));

    let body = if finished {
        Body::from(buffered)
    } else {
        let head = stream::iter((!buffered.is_empty()).then_some(Ok::<_, axum::Error>(buffered)));
        match read_error {
            Some(e) => Body::from_stream(head.chain(stream::iter([Err(e)]))),
            None => Body::from_stream(head.chain(body.into_data_stream())),
        }
    };

    CapturedBody { prefix, body }
}
