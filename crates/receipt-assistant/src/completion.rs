//! Text completion service used to answer questions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use receipt_core::models::AssistantConfig;

use crate::error::{AssistantError, Result};
use crate::history::ChatMessage;

/// Sampling options for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

/// External chat completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete the conversation and return the reply text.
    async fn complete(&self, messages: &[ChatMessage], options: CompletionOptions)
        -> Result<String>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Client for the configured endpoint, token read from `api_key_env`.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let client = Self::new(&config.base_url, &config.model);
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => client.with_api_key(key),
            _ => client,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AssistantError::Config("no API token configured for the completion service".to_string())
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
        };

        debug!(model = %self.model, messages = messages.len(), "Requesting completion");

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(AssistantError::completion(format!("{}: {}", status, error)));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AssistantError::completion("response contained no message"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = ChatRequest {
            model: "openai/gpt-4.1",
            messages: &messages,
            temperature: 0.5,
            top_p: 1.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "openai/gpt-4.1",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.5,
                "top_p": 1.0
            })
        );
    }

    #[test]
    fn test_api_url_trims_slash() {
        let client = OpenAiCompatibleClient::new("https://example.test/inference/", "m");
        assert_eq!(client.api_url(), "https://example.test/inference/chat/completions");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"You spent $5."}}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("You spent $5.")
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_config_error() {
        let client = OpenAiCompatibleClient::new("http://127.0.0.1:9", "m");
        let err = client
            .complete(&[ChatMessage::user("hi")], CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
    }
}
