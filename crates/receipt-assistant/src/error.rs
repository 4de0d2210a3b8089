//! Error types for the receipt assistant.

use thiserror::Error;

/// Errors raised by the assistant and its collaborators.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The document store rejected an operation.
    #[error("document store error: {0}")]
    Store(String),

    /// The completion service returned an error or an unusable response.
    #[error("completion service error: {0}")]
    Completion(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AssistantError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }
}

/// Result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
