//! Product–trend matchmaking pipeline for Market Mind.
//!
//! Runs two model calls in sequence: a sensitive-content filter over the
//! trend feed, then a matching call that pairs catalog products with the
//! surviving trends. Model output is decoded strictly, checked against the
//! inputs it was derived from, and surfaced either as a well-formed match
//! list (possibly empty) or as a [`MatchmakerError`] naming the stage and
//! failure kind.

pub mod codec;
pub mod error;
pub mod filter;
pub mod gemini;
pub mod integrity;
pub mod matching;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod types;

pub use error::{FailureKind, MatchmakerError, ModelError, Stage};
pub use filter::FilterStage;
pub use gemini::GeminiClient;
pub use matching::MatchStage;
pub use model::{GenerationSettings, ModelClient, ModelOutput, ModelRequest};
pub use pipeline::{Pipeline, PipelineState};
pub use retry::{retry_budget, RetryingClient};
pub use types::{IntegrityIssue, MatchmakerConfig, PipelineOutcome, StageOutput};

use std::time::Duration;

use marketmind_core::AppConfig;

/// Build the production pipeline: Gemini behind the retry decorator.
///
/// # Errors
///
/// Returns [`ModelError::Config`] if `GEMINI_API_KEY` is not configured or the
/// base URL is invalid, or [`ModelError::Http`] if the HTTP client cannot be built.
pub fn gemini_pipeline(
    config: &AppConfig,
) -> Result<Pipeline<RetryingClient<GeminiClient>>, ModelError> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| ModelError::Config("GEMINI_API_KEY is not set".to_string()))?;

    let gemini = GeminiClient::with_base_url(
        api_key,
        &config.gemini_model,
        config.model_timeout_secs,
        &config.gemini_base_url,
    )?;
    let client = RetryingClient::new(gemini, config.model_max_retries, config.retry_backoff_base_ms)
        .with_attempt_timeout(Duration::from_secs(config.model_timeout_secs));

    Ok(Pipeline::new(client, MatchmakerConfig::from_app_config(config)))
}
