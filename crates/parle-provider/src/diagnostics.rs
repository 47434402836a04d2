use std::time::Duration;

use parle_core::error::{ParleError, Result};
use parle_core::settings::AppSettings;

/// Fetch the chat-capable model identifiers exposed by the provider.
///
/// Used by settings flows to populate the mode model picker. Audio,
/// embedding, and image models are filtered out since a mode always needs a
/// chat model.
pub async fn fetch_models(base_url: &str, api_key: &str) -> Result<Vec<String>> {
    let trimmed = base_url.trim_end_matches('/');
    let url = format!("{trimmed}/models");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ParleError::Provider(format!("Failed to create HTTP client: {e}")))?;

    let response = client
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|e| ParleError::Provider(format!("Failed to fetch models: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ParleError::Provider(format!("Failed to read models response: {e}")))?;

    if !status.is_success() {
        return Err(ParleError::Provider(format!(
            "Models API error {status}: {body}"
        )));
    }

    let json: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| ParleError::Provider(format!("Failed to parse models response: {e}")))?;

    let mut models: Vec<String> = json["data"]
        .as_array()
        .ok_or_else(|| ParleError::Provider("Models response missing data array".to_string()))?
        .iter()
        .filter_map(|item| item["id"].as_str().map(|s| s.to_string()))
        .filter(|model_id| is_chat_model(model_id))
        .collect();

    models.sort_unstable();
    models.dedup();

    if models.is_empty() {
        return Err(ParleError::Provider(
            "No chat-capable models returned by provider".to_string(),
        ));
    }

    Ok(models)
}

/// Verify that the configured endpoint and API key are usable.
///
/// Maps the common failure shapes to actionable messages instead of raw HTTP
/// noise.
pub async fn test_connection(settings: &AppSettings) -> Result<String> {
    if settings.api_key.trim().is_empty() {
        return Err(ParleError::Provider("Missing API key".to_string()));
    }
    if settings.base_url.trim().is_empty() {
        return Err(ParleError::Provider("Missing base URL".to_string()));
    }
    if settings.model.trim().is_empty() {
        return Err(ParleError::Provider("Missing model".to_string()));
    }

    let trimmed = settings.base_url.trim_end_matches('/');
    let url = format!("{trimmed}/models");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ParleError::Provider(format!("Failed to create HTTP client: {e}")))?;

    let response = client
        .get(&url)
        .bearer_auth(&settings.api_key)
        .send()
        .await
        .map_err(|e| {
            let message = if e.is_timeout() {
                "Connection timed out — check your base URL.".to_string()
            } else if e.is_connect() {
                format!("Connection failed — could not reach {trimmed}")
            } else {
                format!("Request failed: {e}")
            };
            ParleError::Provider(message)
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ParleError::Provider(
            "Authentication failed — check your API key.".to_string(),
        ));
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ParleError::Provider(
            "Access denied — your API key may lack permissions.".to_string(),
        ));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ParleError::Provider(format!("API returned {status}: {body}")));
    }

    Ok("Connection successful — API key is valid.".to_string())
}

fn is_chat_model(model_id: &str) -> bool {
    const EXCLUDED_TOKENS: [&str; 12] = [
        "whisper",
        "transcribe",
        "transcription",
        "audio",
        "speech",
        "tts",
        "embedding",
        "moderation",
        "image",
        "vision",
        "realtime",
        "dall-e",
    ];

    let lower = model_id.to_ascii_lowercase();
    !EXCLUDED_TOKENS.iter().any(|token| lower.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_model_filter_keeps_text_models() {
        assert!(is_chat_model("gpt-4o-mini"));
        assert!(is_chat_model("llama-3.3-70b-versatile"));
    }

    #[test]
    fn test_chat_model_filter_excludes_non_chat_models() {
        assert!(!is_chat_model("whisper-large-v3"));
        assert!(!is_chat_model("gpt-4o-mini-transcribe"));
        assert!(!is_chat_model("text-embedding-3-large"));
        assert!(!is_chat_model("dall-e-3"));
    }

    #[tokio::test]
    async fn test_connection_rejects_incomplete_settings() {
        let mut settings = AppSettings::default();
        settings.api_key = String::new();
        let result = test_connection(&settings).await;
        assert!(matches!(result, Err(ParleError::Provider(ref m)) if m.contains("API key")));

        settings.api_key = "sk-test".to_string();
        settings.base_url = String::new();
        let result = test_connection(&settings).await;
        assert!(matches!(result, Err(ParleError::Provider(ref m)) if m.contains("base URL")));

        settings.base_url = "https://api.openai.com/v1".to_string();
        settings.model = String::new();
        let result = test_connection(&settings).await;
        assert!(matches!(result, Err(ParleError::Provider(ref m)) if m.contains("model")));
    }
}
