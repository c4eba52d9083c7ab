//! LM Studio (OpenAI-compatible) chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ReportGenerator;
use crate::core::config::ReportConfig;
use crate::core::errors::{OrthoparkError, OrthoparkResultExt, Result};

/// Chat completions request body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model identifier loaded in LM Studio
    pub model: String,
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Completion length limit
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: f64,
}

/// One chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender role, `user` for prompts
    pub role: String,
    /// Message text
    pub content: String,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Generated alternatives, first one is used
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// A completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Assistant reply
    pub message: ChatMessage,
}

/// Talks to a local LM Studio server
pub struct LmStudioClient {
    client: reqwest::Client,
    api_base: String,
    model: String,
    max_tokens: usize,
    temperature: f64,
}

impl LmStudioClient {
    /// Build a client from the report configuration.
    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_generic_err("building HTTP client")?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ReportGenerator for LmStudioClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        info!("Requesting report from LM Studio at {}", url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OrthoparkError::report(format!("Request to LM Studio failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OrthoparkError::report(format!(
                "LM Studio API error ({status}): {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            OrthoparkError::report(format!("Invalid LM Studio response: {e}"))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OrthoparkError::report("No choices in LM Studio response"))?
            .message
            .content
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(OrthoparkError::report("LM Studio returned an empty report"));
        }
        debug!("Received {} characters from LM Studio", text.len());
        Ok(text)
    }
}
