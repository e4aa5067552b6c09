//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module converts the raw byte stream of a `chat/completions` response
//! into a stream of [`ChatCompletionChunk`]s.  Events are delimited by a blank
//! line; each event's `data:` lines carry one JSON chunk, and the sentinel
//! `data: [DONE]` ends the stream.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_SKIPPED_EVENTS};
use crate::types::ChatCompletionChunk;
use crate::{Error, Result};

const DONE_SENTINEL: &str = "[DONE]";

/// The outcome of parsing one complete SSE event.
#[derive(Debug)]
enum SseEvent {
    /// A chunk, or the error that replaced it.
    Chunk(Result<ChatCompletionChunk>),
    /// The end-of-stream sentinel.
    Done,
    /// Comments, keep-alives and events without data.
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// The returned stream ends at the `[DONE]` sentinel or when the byte stream
/// ends, whichever comes first.  Transport failures, undecodable events and
/// error payloads are yielded as `Err` items.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    // Convert transport errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, Vec::<u8>::new(), false),
        move |(mut stream, mut buffer, mut finished)| async move {
            loop {
                // First check if we have a complete event in the buffer
                if let Some(event) = take_event(&mut buffer) {
                    match parse_event(&event) {
                        SseEvent::Chunk(chunk) => {
                            STREAM_CHUNKS.click();
                            return Some((chunk, (stream, buffer, finished)));
                        }
                        SseEvent::Done => return None,
                        SseEvent::Skip => {
                            STREAM_SKIPPED_EVENTS.click();
                            continue;
                        }
                    }
                }

                if finished {
                    // A final event may arrive without its trailing blank line.
                    if buffer.iter().all(u8::is_ascii_whitespace) {
                        return None;
                    }
                    let event = std::mem::take(&mut buffer);
                    return match parse_event(&event) {
                        SseEvent::Chunk(chunk) => {
                            STREAM_CHUNKS.click();
                            Some((chunk, (stream, buffer, finished)))
                        }
                        SseEvent::Done | SseEvent::Skip => None,
                    };
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                    }
                    Some(Err(e)) => {
                        buffer.clear();
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => finished = true,
                }
            }
        },
    )
}

/// Remove and return the first complete event from `buffer`.
fn take_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.windows(2).position(|window| window == b"\n\n")?;
    let event = buffer[..end].to_vec();
    buffer.drain(..end + 2);
    Some(event)
}

/// Parse the text of a single event.
fn parse_event(event: &[u8]) -> SseEvent {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            return SseEvent::Chunk(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut event_type = None;
    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        }
    }

    if data.is_empty() {
        return SseEvent::Skip;
    }
    let data = data.join("\n");
    let data = data.trim();
    if data == DONE_SENTINEL {
        return SseEvent::Done;
    }
    if data.is_empty() {
        return SseEvent::Skip;
    }

    if let Some(err) = parse_error_payload(data) {
        return SseEvent::Chunk(Err(err));
    }
    if event_type == Some("error") {
        return SseEvent::Chunk(Err(Error::api(
            500,
            Some("stream_error".to_string()),
            data.to_string(),
            None,
        )));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => SseEvent::Chunk(Ok(chunk)),
        Err(e) => SseEvent::Chunk(Err(Error::serialization(
            format!("Failed to parse chunk JSON: {e}"),
            Some(Box::new(e)),
        ))),
    }
}

/// Recognize `{"error": {...}}` payloads sent in place of a chunk.
fn parse_error_payload(data: &str) -> Option<Error> {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        code: Option<serde_json::Value>,
    }

    let envelope = serde_json::from_str::<ErrorEnvelope>(data).ok()?;
    let detail = envelope.error;
    let message = detail
        .message
        .unwrap_or_else(|| "stream reported an error".to_string());
    let error_type = detail
        .error_type
        .or_else(|| detail.code.map(|code| code.to_string()));
    Some(Error::api(500, error_type, message, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    type ByteResult = std::result::Result<Bytes, std::io::Error>;

    fn chunks_of(
        parts: &[&'static [u8]],
    ) -> impl Stream<Item = ByteResult> + Unpin + Send + use<> {
        stream::iter(
            parts
                .iter()
                .map(|part| Ok(Bytes::from_static(part)))
                .collect::<Vec<_>>(),
        )
    }

    fn content(chunk: &ChatCompletionChunk) -> Option<&str> {
        chunk.delta().and_then(|delta| delta.content.as_deref())
    }

    #[tokio::test]
    async fn parse_single_chunk() {
        let data: &[u8] = b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(content(&chunk), Some("Hi"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn done_sentinel_ends_stream() {
        let data: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(content(&chunk), Some("a"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_split_event() {
        // An event and a multi-byte character split across chunks.
        let chunk1: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"caf\xc3";
        let chunk2: &[u8] = b"\xa9\"}}]}\n";
        let chunk3: &[u8] = b"\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[chunk1, chunk2, chunk3])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(content(&chunk), Some("caf\u{e9}"));
    }

    #[tokio::test]
    async fn crlf_delimiters() {
        let data: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(content(&chunk), Some("x"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn comments_are_skipped() {
        let data: &[u8] = b": keep-alive\n\nevent: ping\n\ndata: {\"choices\":[]}\n\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert!(chunk.choices.is_empty());
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn trailing_event_without_blank_line() {
        let data: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(content(&chunk), Some("end"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn error_payload_is_an_error() {
        let data: &[u8] =
            b"data: {\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let err = sse_stream.next().await.unwrap().unwrap_err();
        assert!(err.is_service_error());
        assert_eq!(err.to_string(), "server_error: overloaded");
    }

    #[tokio::test]
    async fn null_fields_are_not_errors() {
        let data: &[u8] = b"data: {\"choices\":null}\n\n\
data: {\"choices\":[{\"delta\":null,\"finish_reason\":\"stop\"}]}\n\n\
data: {\"choices\":[{\"index\":null,\"delta\":{\"content\":\"x\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"role\":\"tool\",\"content\":\"y\"}}]}\n\n";
        let items: Vec<_> = process_sse(chunks_of(&[data])).collect().await;
        assert_eq!(items.len(), 4);
        let chunks: Vec<ChatCompletionChunk> =
            items.into_iter().map(|item| item.unwrap()).collect();
        assert!(chunks[0].choices.is_empty());
        assert_eq!(content(&chunks[1]), None);
        assert_eq!(content(&chunks[2]), Some("x"));
        assert_eq!(content(&chunks[3]), Some("y"));
    }

    #[tokio::test]
    async fn handle_malformed_json() {
        let data: &[u8] = b"data: not json at all\n\n";
        let mut sse_stream = Box::pin(process_sse(chunks_of(&[data])));
        let event = sse_stream.next().await.unwrap();
        assert!(matches!(event, Err(Error::Serialization { .. })));
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let items: Vec<ByteResult> = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[]}\n\ndata: {\"cho")),
            Err(std::io::Error::other("connection reset")),
        ];
        let mut sse_stream = Box::pin(process_sse(stream::iter(items)));
        assert!(sse_stream.next().await.unwrap().is_ok());
        let err = sse_stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Streaming { .. }));
        assert!(sse_stream.next().await.is_none());
    }
}
