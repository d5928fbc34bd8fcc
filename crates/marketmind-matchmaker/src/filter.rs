//! Sensitive-content filter stage.

use std::time::Duration;

use marketmind_core::{IntegrityPolicy, TrendRecord};

use crate::codec::decode_records;
use crate::error::{MatchmakerError, Stage};
use crate::integrity::reconcile_filtered;
use crate::model::{invoke_with_deadline, GenerationSettings, ModelClient, ModelRequest};
use crate::prompts::filter_prompt;
use crate::types::{MatchmakerConfig, StageOutput};

/// Removes trends that fall under the sensitive-topic policy with one model call.
#[derive(Debug, Clone)]
pub struct FilterStage {
    settings: GenerationSettings,
    policy: IntegrityPolicy,
    deadline: Duration,
}

impl FilterStage {
    #[must_use]
    pub fn new(config: &MatchmakerConfig) -> Self {
        Self {
            settings: config.filter_settings,
            policy: config.integrity_policy,
            deadline: config.stage_timeout,
        }
    }

    /// Filter `trends`, returning the surviving records in input order.
    ///
    /// An empty input returns an empty output without calling the model.
    ///
    /// # Errors
    ///
    /// - [`MatchmakerError::Transport`] if the model call fails or times out.
    /// - [`MatchmakerError::Parse`] if the response is not a bare JSON array of trends.
    /// - [`MatchmakerError::Integrity`] if the response rewrites or invents
    ///   records and the policy is [`IntegrityPolicy::Reject`].
    pub async fn run<M: ModelClient>(
        &self,
        client: &M,
        trends: &[TrendRecord],
    ) -> Result<StageOutput<TrendRecord>, MatchmakerError> {
        if trends.is_empty() {
            tracing::debug!("no trends to filter; skipping model call");
            return Ok(StageOutput::empty());
        }

        let request = ModelRequest {
            prompt: filter_prompt(trends)?,
            settings: self.settings,
        };

        let output = invoke_with_deadline(client, &request, self.deadline)
            .await
            .map_err(|source| MatchmakerError::Transport {
                stage: Stage::Filter,
                source,
            })?;
        tracing::debug!(raw = %output.text, "filter stage response");

        let decoded: Vec<TrendRecord> = decode_records(Stage::Filter, &output.text)?;
        let reconciled = reconcile_filtered(trends, decoded, self.policy)?;

        tracing::info!(
            input = trends.len(),
            kept = reconciled.records.len(),
            removed = trends.len() - reconciled.records.len(),
            "sensitive-content filter complete"
        );
        Ok(reconciled)
    }
}
