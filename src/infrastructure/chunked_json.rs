// Chunked JSON streaming utilities
use crate::application::streaming_service::StreamMessage;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc::Receiver;

/// Drain `rx` into a chunked body, one length-prefixed frame per message.
/// No Content-Encoding is set: frames are compressed individually, not the body.
pub fn framed_stream_response(mut rx: Receiver<StreamMessage>, compress: bool) -> Response<Body> {
    let frames = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield serialize_chunk(msg, compress).await;
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(frames))
        .unwrap_or_else(|e| {
            tracing::error!("Stream response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Serialize a single StreamMessage to a frame
async fn serialize_chunk(msg: StreamMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&msg)?;

    let payload = if compress {
        brotli_compress(&json).await?
    } else {
        json
    };

    // 4-byte big-endian length, then the payload
    let length = u32::try_from(payload.len())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}
