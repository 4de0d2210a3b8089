//! Chat assistant answering questions about stored receipts.
//!
//! This crate provides:
//! - A shared, append-only chat history
//! - A document store trait with an in-memory lexical implementation
//! - A completion service trait with an OpenAI-compatible HTTP client
//! - `ReceiptAssistant`, which ties retrieval, history and completion together

pub mod assistant;
pub mod completion;
pub mod error;
pub mod history;
pub mod store;

pub use assistant::ReceiptAssistant;
pub use completion::{CompletionOptions, CompletionService, OpenAiCompatibleClient};
pub use error::{AssistantError, Result};
pub use history::{ChatHistory, ChatMessage, Role};
pub use store::{Document, DocumentStore, InMemoryDocumentStore, ReceiptItem, ReceiptRecord};
