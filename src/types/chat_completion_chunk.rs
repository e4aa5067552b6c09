use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Role;

/// One streamed piece of a chat completion.
///
/// Every field is optional or defaulted: providers differ in what they send,
/// and a chunk that lacks a field, sends it as `null`, or names a role this
/// client does not know is still a valid (possibly empty) chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier shared by all chunks of one completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Per-choice deltas; this client only requests a single choice.
    #[serde(default, deserialize_with = "lenient_choices")]
    pub choices: Vec<ChunkChoice>,
}

/// The delta for one choice within a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Index of the choice.
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u32,

    /// The incremental change carried by this chunk.
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: ChunkDelta,

    /// Why generation stopped, present on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental message content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Role announcement, usually only on the first chunk.
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,

    /// A piece of the assistant's text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// `null` entries are dropped along with a `null` list.
fn lenient_choices<'de, D>(deserializer: D) -> Result<Vec<ChunkChoice>, D::Error>
where
    D: Deserializer<'de>,
{
    let choices = Option::<Vec<Option<ChunkChoice>>>::deserialize(deserializer)?;
    Ok(choices.into_iter().flatten().flatten().collect())
}

// A role outside `Role` (tool, function, ...) is dropped; the content is kept.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

impl ChatCompletionChunk {
    /// Create a chunk carrying a single content delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    role: None,
                    content: Some(content.into()),
                },
                ..ChunkChoice::default()
            }],
            ..Self::default()
        }
    }

    /// Create a chunk that only announces the responding role.
    pub fn role(role: Role) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    role: Some(role),
                    content: None,
                },
                ..ChunkChoice::default()
            }],
            ..Self::default()
        }
    }

    /// The delta of the first choice, if the chunk has one.
    pub fn delta(&self) -> Option<&ChunkDelta> {
        self.choices.first().map(|choice| &choice.delta)
    }
}
