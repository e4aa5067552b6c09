//! Ordered conversation history.

use crate::types::{Role, Turn};

/// Owns the role-tagged turns of one conversation.
///
/// The first turn is always the system turn.  Turns are only ever appended;
/// the sole way to drop history is [`TranscriptStore::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
}

impl TranscriptStore {
    /// Creates a transcript holding only the system turn.
    pub fn new(system_content: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_content)],
        }
    }

    /// Adds a turn at the end.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn::new(role, content));
    }

    /// Replaces the history with a single system turn.
    pub fn reset(&mut self, system_content: impl Into<String>) {
        self.turns.clear();
        self.turns.push(Turn::system(system_content));
    }

    /// Content of the most recent turn, or `""` when only the system turn exists.
    pub fn last(&self) -> &str {
        match self.turns.as_slice() {
            [] | [_] => "",
            [.., last] => &last.content,
        }
    }

    /// The full ordered history, for submission upstream.
    pub fn as_context(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns, including the system turn.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system turn is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates the turns in order.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
