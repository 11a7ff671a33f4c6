//! Hayrick Chat — grounded answer generation over an OpenAI-compatible
//! chat completions endpoint.
//!
//! The prompt template is fixed: the model is told to answer only from
//! the provided context and to fall back to [`UNKNOWN_ANSWER`] when the
//! context is insufficient.

pub mod prompt;

pub use prompt::{build_messages, ChatMessage, UNKNOWN_ANSWER};

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use hayrick_core::{Error, ModelConfig, Result};

/// Client for `{BASE_URL}/chat/completions`.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Model used when the request does not override it.
    pub default_model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &ModelConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            default_model: config.model_chat.clone(),
        }
    }

    /// Generate a grounded answer for `question` from `context`.
    /// Returns the model's text verbatim.
    pub async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        model_name: Option<&str>,
    ) -> Result<String> {
        let model = model_name.unwrap_or(&self.default_model);
        let messages = build_messages(question, context);

        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.2,
        });

        debug!("Calling chat model {} with {} context chars", model, context.len());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, detail)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("bad response body: {}", e)))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(answer)
    }
}
