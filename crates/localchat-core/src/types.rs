//! Domain types shared by the loader, the similarity index and the chat loop.

use serde::{Deserialize, Serialize};

pub type UnitId = String;

/// A single retrievable paragraph.
///
/// - `id`: `"<filename>#p<ordinal>"`, where the ordinal is the 1-based split
///   position inside the source file (blank segments still consume a number)
/// - `text`: trimmed paragraph content, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub id: UnitId,
    pub text: String,
}

impl DocumentUnit {
    pub fn new(id: impl Into<UnitId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A ranked hit returned by `top_k`.
///
/// `score` is the cosine similarity between query and paragraph, so higher is
/// always better and it stays within `[0, 1]` for non-negative weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredUnit {
    pub id: UnitId,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of the conversation as persisted in the chat history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
    pub fn assistant(content: impl Into<String>) -> Self { Self { role: Role::Assistant, content: content.into() } }
    pub fn system(content: impl Into<String>) -> Self { Self { role: Role::System, content: content.into() } }
}
