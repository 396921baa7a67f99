//! Common types used throughout the ollabot crate.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Role of a message in the conversation.
///
/// Maps to Ollama chat message roles and to the `role` column of the
/// persisted history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the human user
    User,
    /// Message from the model
    Assistant,
    /// System prompt; sent to the model but never stored in a context
    System,
}

/// One role-tagged message unit stored in a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    #[serde(rename = "content")]
    pub text: String,
}

impl Turn {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }
}
