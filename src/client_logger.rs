//! Logging hooks for completion client traffic.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to
//! capture every request sent and every chunk streamed back through the
//! [`Completions`](crate::Completions) client, plus [`JsonLinesLogger`], which
//! appends that traffic to a file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::types::{ChatCompletionChunk, ChatCompletionRequest};

/// A trait for logging completion client operations.
///
/// Implementations must be cheap and infallible from the caller's point of
/// view: a logger never fails a request.
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log an individual streamed chunk.
    fn log_stream_chunk(&self, chunk: &ChatCompletionChunk);

    /// Log the error that ended a stream.
    fn log_stream_error(&self, _error: &Error) {}

    /// Log the end of a stream, whether it finished or failed.
    fn log_stream_done(&self) {}
}

/// Writes client traffic as one JSON object per line.
pub struct JsonLinesLogger {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesLogger {
    /// Opens (or creates) `path` for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|err| Error::io("failed to open client log", err))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_record<T: Serialize>(&self, kind: &str, payload: &T) {
        let record = json!({ "kind": kind, "payload": payload });
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *writer, &record).is_ok() {
            let _ = writer.write_all(b"\n");
            let _ = writer.flush();
        }
    }
}

impl ClientLogger for JsonLinesLogger {
    fn log_request(&self, request: &ChatCompletionRequest) {
        self.write_record("request", request);
    }

    fn log_stream_chunk(&self, chunk: &ChatCompletionChunk) {
        self.write_record("chunk", chunk);
    }

    fn log_stream_error(&self, error: &Error) {
        self.write_record("error", &error.to_string());
    }

    fn log_stream_done(&self) {
        self.write_record("done", &serde_json::Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Model, Turn};

    #[test]
    fn writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "streamchat-client-log-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let logger = JsonLinesLogger::open(&path).unwrap();
        logger.log_request(&ChatCompletionRequest::new(
            Model::default(),
            vec![Turn::user("hi")],
        ));
        logger.log_stream_chunk(&ChatCompletionChunk::text("hello"));
        logger.log_stream_error(&Error::streaming("connection reset", None));
        logger.log_stream_done();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["kind"], "request");
        assert_eq!(lines[0]["payload"]["messages"][0]["content"], "hi");
        assert_eq!(lines[1]["kind"], "chunk");
        assert_eq!(lines[2]["kind"], "error");
        assert_eq!(lines[2]["payload"], "Streaming error: connection reset");
        assert_eq!(lines[3]["kind"], "done");

        let _ = std::fs::remove_file(&path);
    }
}
