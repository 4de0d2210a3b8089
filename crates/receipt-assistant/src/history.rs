//! Append-only chat history shared between requests.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation log. Clones share the same underlying messages.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages in insertion order.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.messages.write().await.push(ChatMessage::user(content));
    }

    pub async fn add_assistant_message(&self, content: impl Into<String>) {
        self.messages
            .write()
            .await
            .push(ChatMessage::assistant(content));
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// One `role: content` line per message, or `None` when empty.
    pub async fn transcript(&self) -> Option<String> {
        let messages = self.messages.read().await;
        if messages.is_empty() {
            return None;
        }
        Some(
            messages
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
