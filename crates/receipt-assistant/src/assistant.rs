//! Retrieval-augmented question answering over stored receipts.

use std::sync::Arc;

use tracing::{info, warn};

use receipt_core::models::AssistantConfig;

use crate::completion::{CompletionOptions, CompletionService};
use crate::error::Result;
use crate::history::{ChatHistory, ChatMessage};
use crate::store::DocumentStore;

const NO_CONTEXT: &str = "No relevant receipts found.";
const NO_HISTORY: &str = "No previous conversation";

/// Answers questions about stored receipts with a completion service.
pub struct ReceiptAssistant {
    store: Arc<dyn DocumentStore>,
    history: ChatHistory,
    completion: Arc<dyn CompletionService>,
    options: CompletionOptions,
    context_limit: usize,
}

impl ReceiptAssistant {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        history: ChatHistory,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            store,
            history,
            completion,
            options: CompletionOptions::default(),
            context_limit: 3,
        }
    }

    /// Apply sampling options and context size from configuration.
    pub fn with_config(mut self, config: &AssistantConfig) -> Self {
        self.options = CompletionOptions {
            temperature: config.temperature,
            top_p: config.top_p,
        };
        self.context_limit = config.context_limit;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Stored receipts relevant to `query`, joined by blank lines.
    pub async fn relevant_context(&self, query: &str) -> Result<String> {
        let documents = self.store.query(query, self.context_limit).await?;
        if documents.is_empty() {
            return Ok(NO_CONTEXT.to_string());
        }
        Ok(documents
            .into_iter()
            .map(|d| d.content)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Answer `query`, recording both turns in the chat history.
    pub async fn ask(&self, query: &str) -> Result<String> {
        let context = self.relevant_context(query).await?;
        let transcript = self
            .history
            .transcript()
            .await
            .unwrap_or_else(|| NO_HISTORY.to_string());

        let messages = [
            ChatMessage::system(system_prompt(&context, &transcript)),
            ChatMessage::user(query),
        ];

        self.history.add_user_message(query).await;

        info!(model = self.completion.model_name(), "Answering receipt question");
        let reply = match self.completion.complete(&messages, self.options).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Completion failed: {}", e);
                return Err(e);
            }
        };

        self.history.add_assistant_message(reply.clone()).await;
        Ok(reply)
    }
}

fn system_prompt(context: &str, history: &str) -> String {
    format!(
        "You are a helpful assistant specialized in analyzing receipt and expense data.\n\
         Use the following receipt context and chat history to answer the user's question. You can help with:\n\
         - Summarizing spending patterns\n\
         - Finding specific receipts or purchases\n\
         - Calculating totals for specific periods or categories\n\
         - Providing insights on spending habits\n\
         \n\
         If you don't have enough information or the context doesn't contain what's being asked,\n\
         let the user know politely.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         CHAT HISTORY:\n\
         {history}"
    )
}
