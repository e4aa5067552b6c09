// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod model;
pub mod role;
pub mod stream_fragment;
pub mod turn;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use chat_completion_request::ChatCompletionRequest;
pub use model::{KnownModel, Model};
pub use role::Role;
pub use stream_fragment::StreamFragment;
pub use turn::Turn;
