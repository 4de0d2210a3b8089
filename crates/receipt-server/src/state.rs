//! Server state management.

use std::sync::Arc;
use std::time::Duration;

use receipt_assistant::{
    ChatHistory, CompletionService, DocumentStore, InMemoryDocumentStore, OpenAiCompatibleClient,
    ReceiptAssistant,
};
use receipt_core::{ReceiptConfig, ReceiptProcessor, TextRecognizer};

/// Processor over whichever recognizer the configuration selected.
pub type DynProcessor = ReceiptProcessor<Box<dyn TextRecognizer>>;

/// Shared application state, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DynProcessor>,
    pub store: Arc<dyn DocumentStore>,
    pub history: ChatHistory,
    pub assistant: Arc<ReceiptAssistant>,
    /// Upper bound for one processing call, `None` when unlimited.
    pub ocr_timeout: Option<Duration>,
}

impl AppState {
    /// Wire the given collaborators together.
    pub fn new(
        processor: DynProcessor,
        store: Arc<dyn DocumentStore>,
        completion: Arc<dyn CompletionService>,
        config: &ReceiptConfig,
    ) -> Self {
        let history = ChatHistory::new();
        let assistant = ReceiptAssistant::new(store.clone(), history.clone(), completion)
            .with_config(&config.assistant);

        Self {
            processor: Arc::new(processor),
            store,
            history,
            assistant: Arc::new(assistant),
            ocr_timeout: (config.ocr.timeout_secs > 0)
                .then(|| Duration::from_secs(config.ocr.timeout_secs)),
        }
    }

    /// Recognizer, in-memory store and HTTP completion client from `config`.
    pub fn from_config(config: &ReceiptConfig) -> receipt_core::Result<Self> {
        let processor = ReceiptProcessor::from_config(config)?;
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let completion: Arc<dyn CompletionService> =
            Arc::new(OpenAiCompatibleClient::from_config(&config.assistant));
        Ok(Self::new(processor, store, completion, config))
    }
}
