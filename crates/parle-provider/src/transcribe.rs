use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, warn};

use parle_core::error::{ParleError, Result};

/// Port for turning captured audio into text.
///
/// The hint, when present, biases transcription toward expected vocabulary;
/// implementations may drop it if the remote rejects the parameter.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_wav: Vec<u8>, prompt: Option<&str>) -> Result<String>;
}

/// HTTP transcriber for OpenAI-compatible `/audio/transcriptions` endpoints.
pub struct HttpTranscriber {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl HttpTranscriber {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: build_transcription_url(base_url),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio_wav: Vec<u8>, prompt: Option<&str>) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(ParleError::Provider("Missing API key".to_string()));
        }

        let prompt = prompt.filter(|p| !p.trim().is_empty());

        if let Some(prompt_value) = prompt {
            let first_attempt = self.send_request(audio_wav.clone(), Some(prompt_value)).await;
            return match first_attempt {
                Ok(text) => Ok(text),
                Err(error) if should_retry_without_prompt(&error) => {
                    warn!(error = %error, "Provider rejected the prompt parameter, retrying without it");
                    self.send_request(audio_wav, None)
                        .await
                        .map_err(|retry_error| ParleError::Provider(retry_error.to_string()))
                }
                Err(error) => Err(ParleError::Provider(error.to_string())),
            };
        }

        self.send_request(audio_wav, None)
            .await
            .map_err(|error| ParleError::Provider(error.to_string()))
    }
}

impl HttpTranscriber {
    async fn send_request(&self, audio_wav: Vec<u8>, prompt: Option<&str>) -> ApiResult<String> {
        let mut form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(audio_wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|error| ApiError::transport(error.to_string()))?,
            )
            .text("model", self.model.clone());

        if let Some(prompt_value) = prompt {
            form = form.text("prompt", prompt_value.to_string());
        }

        debug!(url = %self.url, model = %self.model, with_prompt = prompt.is_some(), "Sending transcription request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|error| ApiError::transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::transport(error.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::api(status, body));
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|error| ApiError::transport(error.to_string()))?;
        Ok(json["text"].as_str().unwrap_or("").to_string())
    }
}

/// Normalize a base URL into the transcription endpoint, tolerating both a
/// bare API root and an already-complete endpoint, with or without a
/// trailing slash.
pub fn build_transcription_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/audio/transcriptions") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/audio/transcriptions")
    }
}

/// The remote rejected the request in a way that suggests the prompt
/// parameter itself is the problem, so a retry without it may succeed.
fn should_retry_without_prompt(error: &ApiError) -> bool {
    let Some(status) = error.status else {
        return false;
    };

    if !matches!(status.as_u16(), 400 | 404 | 415 | 422) {
        return false;
    }

    let body = error.body.to_ascii_lowercase();
    body.contains("prompt")
        || body.contains("unknown parameter")
        || body.contains("not allowed")
        || body.contains("unexpected field")
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Internal error carrying the HTTP status (when the request reached the
/// remote) so the retry predicate can distinguish API rejections from
/// transport failures.
#[derive(Debug)]
struct ApiError {
    status: Option<reqwest::StatusCode>,
    body: String,
}

impl ApiError {
    fn api(status: reqwest::StatusCode, body: String) -> Self {
        Self {
            status: Some(status),
            body,
        }
    }

    fn transport(message: String) -> Self {
        Self {
            status: None,
            body: message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "API error {status}: {}", self.body),
            None => write!(f, "{}", self.body),
        }
    }
}
