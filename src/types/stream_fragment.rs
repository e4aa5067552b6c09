use crate::types::{ChatCompletionChunk, Role};

/// An incremental piece of assistant output.
///
/// Concatenating the text of every fragment of a response, in order, yields
/// the full reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFragment {
    /// The new text; empty for heartbeat and role-only chunks.
    pub text: String,

    /// Role announcement carried by the chunk, if any.
    pub role: Option<Role>,
}

impl StreamFragment {
    /// Create a fragment with the given text and no role metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: None,
        }
    }

    /// Returns true if the fragment carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<ChatCompletionChunk> for StreamFragment {
    fn from(chunk: ChatCompletionChunk) -> Self {
        let Some(choice) = chunk.choices.into_iter().next() else {
            return StreamFragment::default();
        };
        StreamFragment {
            text: choice.delta.content.unwrap_or_default(),
            role: choice.delta.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_chunk() {
        let fragment = StreamFragment::from(ChatCompletionChunk::text("4"));
        assert_eq!(fragment, StreamFragment::new("4"));
    }

    #[test]
    fn role_chunk_is_empty() {
        let fragment = StreamFragment::from(ChatCompletionChunk::role(Role::Assistant));
        assert!(fragment.is_empty());
        assert_eq!(fragment.role, Some(Role::Assistant));
    }

    #[test]
    fn chunk_without_choices_is_empty() {
        let fragment = StreamFragment::from(ChatCompletionChunk::default());
        assert_eq!(fragment, StreamFragment::default());
    }
}
