use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use parle_core::error::{ParleError, Result};

/// Port for the optional second-pass formatting of a transcript.
///
/// The mode's system prompt is the instruction; the raw transcript is the
/// user turn. Failures here are recovered by the session manager, which falls
/// back to the unformatted transcript.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, model: &str, system_prompt: &str, user_text: &str) -> Result<String>;
}

/// HTTP completer for OpenAI-compatible `/chat/completions` endpoints.
pub struct HttpChatCompleter {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpChatCompleter {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ParleError::Provider(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: build_completion_url(base_url),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatCompleter for HttpChatCompleter {
    async fn complete(&self, model: &str, system_prompt: &str, user_text: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text }
            ]
        });

        debug!(url = %self.url, model, "Sending completion request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleError::Provider(format!("Format request failed: {e}")))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| ParleError::Provider(format!("Failed to read format response: {e}")))?;

        if !status.is_success() {
            return Err(ParleError::Provider(format!(
                "Format API error {status}: {response_body}"
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&response_body)
            .map_err(|e| ParleError::Provider(format!("Failed to parse format response: {e}")))?;

        extract_completion_text(&json).ok_or_else(|| {
            ParleError::Provider(
                "Format response missing choices[0].message.content".to_string(),
            )
        })
    }
}

fn build_completion_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    format!("{trimmed}/chat/completions")
}

fn extract_completion_text(json: &serde_json::Value) -> Option<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}
