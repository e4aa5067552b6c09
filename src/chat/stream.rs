//! Consumption of one streaming completion.

use std::time::Instant;

use futures::stream::{self, Stream, StreamExt};

use crate::client::{ChunkStream, CompletionService};
use crate::error::Result;
use crate::observability::{CONSUMER_ERRORS, CONSUMER_FRAGMENTS, CONSUMER_REQUESTS, CONSUMER_TTFF};
use crate::types::{ChatCompletionRequest, StreamFragment};

enum ConsumerState {
    Pending(ChatCompletionRequest),
    Streaming {
        chunks: ChunkStream,
        started: Instant,
        seen_fragment: bool,
    },
    Done,
}

/// Drives a single request against a [`CompletionService`].
pub struct StreamConsumer<'a, S: CompletionService + ?Sized> {
    service: &'a S,
}

impl<'a, S: CompletionService + ?Sized> StreamConsumer<'a, S> {
    /// Creates a consumer over `service`.
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Streams the reply to `request` as fragments.
    ///
    /// The request is issued when the stream is first polled.  Every upstream
    /// chunk becomes exactly one fragment, empty when the chunk carries no
    /// text.  The first upstream error is yielded as an `Err` and ends the
    /// stream; the stream also ends when the upstream completes.
    pub fn consume(
        self,
        request: ChatCompletionRequest,
    ) -> impl Stream<Item = Result<StreamFragment>> + Send + 'a {
        let service = self.service;
        stream::unfold(
            ConsumerState::Pending(request),
            move |state| async move {
                let (mut chunks, started, seen_fragment) = match state {
                    ConsumerState::Pending(request) => {
                        CONSUMER_REQUESTS.click();
                        let started = Instant::now();
                        match service.stream(request).await {
                            Ok(chunks) => (chunks, started, false),
                            Err(err) => {
                                CONSUMER_ERRORS.click();
                                return Some((Err(err), ConsumerState::Done));
                            }
                        }
                    }
                    ConsumerState::Streaming {
                        chunks,
                        started,
                        seen_fragment,
                    } => (chunks, started, seen_fragment),
                    ConsumerState::Done => return None,
                };

                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        if !seen_fragment {
                            CONSUMER_TTFF.add(started.elapsed().as_secs_f64());
                        }
                        CONSUMER_FRAGMENTS.click();
                        let next = ConsumerState::Streaming {
                            chunks,
                            started,
                            seen_fragment: true,
                        };
                        Some((Ok(StreamFragment::from(chunk)), next))
                    }
                    Some(Err(err)) => {
                        CONSUMER_ERRORS.click();
                        Some((Err(err), ConsumerState::Done))
                    }
                    None => None,
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{ChatCompletionChunk, Model, Role, Turn};
    use std::sync::Mutex;

    struct ScriptedService {
        items: Mutex<Option<Result<Vec<Result<ChatCompletionChunk>>>>>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl ScriptedService {
        fn new(items: Result<Vec<Result<ChatCompletionChunk>>>) -> Self {
            Self {
                items: Mutex::new(Some(items)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for ScriptedService {
        async fn stream(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
            self.requests.lock().unwrap().push(request);
            let items = self.items.lock().unwrap().take().expect("single use");
            Ok(Box::pin(stream::iter(items?)))
        }
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest::new(Model::default(), vec![Turn::user("hi")])
    }

    async fn collect(service: &ScriptedService) -> Vec<Result<StreamFragment>> {
        StreamConsumer::new(service)
            .consume(request())
            .collect()
            .await
    }

    #[tokio::test]
    async fn forwards_every_chunk_in_order() {
        let service = ScriptedService::new(Ok(vec![
            Ok(ChatCompletionChunk::role(Role::Assistant)),
            Ok(ChatCompletionChunk::text("Hel")),
            Ok(ChatCompletionChunk::default()),
            Ok(ChatCompletionChunk::text("lo")),
        ]));
        let fragments: Vec<StreamFragment> = collect(&service)
            .await
            .into_iter()
            .map(|f| f.unwrap())
            .collect();
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["", "Hel", "", "lo"]);
        assert_eq!(fragments[0].role, Some(Role::Assistant));
        assert_eq!(service.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_failure_yields_single_error() {
        let service = ScriptedService::new(Err(Error::rate_limit("slow down", None)));
        let items = collect(&service).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(Error::RateLimit { .. })));
    }

    #[tokio::test]
    async fn stops_after_mid_stream_error() {
        let service = ScriptedService::new(Ok(vec![
            Ok(ChatCompletionChunk::text("par")),
            Err(Error::streaming("connection reset", None)),
            Ok(ChatCompletionChunk::text("never")),
        ]));
        let items = collect(&service).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "par");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn request_is_lazy() {
        let service = ScriptedService::new(Ok(vec![]));
        let stream = StreamConsumer::new(&service).consume(request());
        assert!(service.requests.lock().unwrap().is_empty());
        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
        assert_eq!(service.requests.lock().unwrap().len(), 1);
    }
}
