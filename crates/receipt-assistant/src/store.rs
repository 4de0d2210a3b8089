//! Receipt document storage and retrieval.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Local;
use receipt_core::ReceiptFields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AssistantError, Result};

/// A stored document with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, Value>,
}

/// Store of receipt documents queried by free text.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Add a document under `id`. Ids must be unique.
    async fn add(&self, document: String, metadata: HashMap<String, Value>, id: String)
        -> Result<()>;

    /// Up to `limit` documents relevant to `text`, most relevant first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>>;

    /// Number of stored documents.
    async fn count(&self) -> Result<usize>;
}

/// Lexical in-memory store.
///
/// Documents are ranked by how many distinct query words they contain;
/// ties go to the most recently added document.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add(
        &self,
        document: String,
        metadata: HashMap<String, Value>,
        id: String,
    ) -> Result<()> {
        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| d.id == id) {
            return Err(AssistantError::store(format!("duplicate document id: {}", id)));
        }
        documents.push(Document {
            id,
            content: document,
            metadata,
        });
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>> {
        let query = tokens(text);
        let documents = self.documents.read().await;

        let mut scored: Vec<(usize, usize)> = documents
            .iter()
            .enumerate()
            .filter_map(|(index, doc)| {
                let words = tokens(&doc.content);
                let score = query.iter().filter(|t| words.contains(*t)).count();
                (score > 0).then_some((score, index))
            })
            .collect();

        scored.sort_by(|a, b| b.cmp(a));
        debug!("Query matched {} of {} documents", scored.len(), documents.len());

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, index)| documents[index].clone())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.read().await.len())
    }
}

/// One purchased item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
}

/// A receipt submitted for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub title: String,
    pub total: f64,
    pub date: String,
    pub items: Vec<ReceiptItem>,
    pub raw_text: String,
}

impl ReceiptRecord {
    /// Record for freshly extracted fields. Item lines carry no price.
    pub fn from_fields(fields: &ReceiptFields) -> Self {
        Self {
            title: fields.vendor_name.clone(),
            total: fields.total_as_f64(),
            date: fields.date.clone(),
            items: fields
                .items
                .iter()
                .map(|name| ReceiptItem {
                    name: name.clone(),
                    price: 0.0,
                })
                .collect(),
            raw_text: fields.raw_text.clone(),
        }
    }

    /// Render as the text document that gets indexed.
    pub fn to_document(&self) -> String {
        let items = self
            .items
            .iter()
            .map(|item| format!("- {}: ${}", item.name, item.price))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Receipt from: {}\nDate: {}\nTotal: ${:.2}\n\nItems:\n{}\n\nRaw OCR Text:\n{}",
            self.title, self.date, self.total, items, self.raw_text
        )
    }

    /// Title, date, total and the time of storage.
    pub fn metadata(&self) -> HashMap<String, Value> {
        HashMap::from([
            ("title".to_string(), Value::from(self.title.clone())),
            ("date".to_string(), Value::from(self.date.clone())),
            ("total".to_string(), Value::from(self.total)),
            ("timestamp".to_string(), Value::from(Local::now().to_rfc3339())),
        ])
    }

    /// Fresh `receipt_<uuid>` document id.
    pub fn new_id() -> String {
        format!("receipt_{}", uuid::Uuid::new_v4())
    }

    /// Render and add this receipt to `store`, returning its id.
    pub async fn store_in(&self, store: &dyn DocumentStore) -> Result<String> {
        let id = Self::new_id();
        store
            .add(self.to_document(), self.metadata(), id.clone())
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(title: &str, total: f64) -> ReceiptRecord {
        ReceiptRecord {
            title: title.to_string(),
            total,
            date: "2024-03-15".to_string(),
            items: vec![ReceiptItem {
                name: "Coffee".to_string(),
                price: 3.5,
            }],
            raw_text: "COFFEE 3.50".to_string(),
        }
    }

    #[test]
    fn test_document_format() {
        assert_eq!(
            record("ACME STORE", 3.5).to_document(),
            "Receipt from: ACME STORE\nDate: 2024-03-15\nTotal: $3.50\n\nItems:\n- Coffee: $3.5\n\nRaw OCR Text:\nCOFFEE 3.50"
        );
    }

    #[test]
    fn test_metadata_and_id() {
        let metadata = record("ACME", 1.0).metadata();
        assert_eq!(metadata["title"], "ACME");
        assert_eq!(metadata["total"], 1.0);
        assert!(metadata.contains_key("timestamp"));
        assert!(ReceiptRecord::new_id().starts_with("receipt_"));
    }

    #[tokio::test]
    async fn test_query_ranks_by_overlap_then_recency() {
        let store = InMemoryDocumentStore::new();
        record("GROCER", 10.0).store_in(&store).await.unwrap();
        record("BAKERY", 4.0).store_in(&store).await.unwrap();
        store
            .add("bakery bread croissant".to_string(), HashMap::new(), "x".to_string())
            .await
            .unwrap();

        let hits = store.query("bakery croissant", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "x");
        assert!(hits[1].content.contains("BAKERY"));

        // Equal overlap: newest first.
        let hits = store.query("coffee", 1).await.unwrap();
        assert!(hits[0].content.contains("BAKERY"));
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_query_without_overlap_is_empty() {
        let store = InMemoryDocumentStore::new();
        record("GROCER", 10.0).store_in(&store).await.unwrap();
        assert!(store.query("airline tickets", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let store = InMemoryDocumentStore::new();
        store.add("a".into(), HashMap::new(), "id".into()).await.unwrap();
        assert!(matches!(
            store.add("b".into(), HashMap::new(), "id".into()).await,
            Err(AssistantError::Store(_))
        ));
    }
}
