//! HTTP client for the Gemini `generateContent` REST endpoint.
//!
//! Sends one prompt per call with JSON-only output requested and the
//! provider's safety filters set to block at low probability and above.
//! The concatenated candidate text is returned unmodified.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{ModelClient, ModelOutput, ModelRequest};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const BLOCKED_HARM_CATEGORIES: [&str; 5] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];

/// Client for the Gemini generative language API.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client pointed at the production Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ModelError::Config`] if `base_url` or
    /// `model` do not form a valid endpoint URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("marketmind/0.1 (matchmaker)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(&format!("v1beta/models/{model}:generateContent")))
            .map_err(|e| ModelError::Config(format!("invalid Gemini endpoint '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        let body = GenerateContentRequest::new(request);
        tracing::debug!(
            model = %self.model,
            prompt_chars = request.prompt.len(),
            temperature = request.settings.temperature,
            max_output_tokens = request.settings.max_output_tokens,
            "sending Gemini request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Envelope(e.to_string()))?;
        let text = extract_text(envelope)?;
        Ok(ModelOutput { text })
    }
}

impl ModelClient for GeminiClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        self.generate(request).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(request: &'a ModelRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![PartRequest {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.settings.temperature,
                max_output_tokens: request.settings.max_output_tokens,
                response_mime_type: "application/json",
            },
            safety_settings: BLOCKED_HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_LOW_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<PartRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct PartRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Concatenate the text parts of the first candidate, skipping thought parts.
fn extract_text(envelope: GenerateContentResponse) -> Result<String, ModelError> {
    if let Some(reason) = envelope
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(ModelError::Blocked(reason));
    }

    let Some(candidate) = envelope.candidates.into_iter().next() else {
        return Err(ModelError::EmptyResponse("no candidates".to_string()));
    };
    let finish_reason = candidate.finish_reason.unwrap_or_default();

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(if finish_reason == "SAFETY" {
            ModelError::Blocked(finish_reason)
        } else {
            ModelError::EmptyResponse(format!("finish reason '{finish_reason}'"))
        });
    }

    if finish_reason == "MAX_TOKENS" {
        tracing::warn!("Gemini response hit the output token limit; text may be truncated");
    }
    Ok(text)
}
