//! Product–trend matching stage.

use std::time::Duration;

use marketmind_core::{IntegrityPolicy, Match, Product, TrendRecord};

use crate::codec::decode_records;
use crate::error::{MatchmakerError, Stage};
use crate::integrity::reconcile_matches;
use crate::model::{invoke_with_deadline, GenerationSettings, ModelClient, ModelRequest};
use crate::prompts::match_prompt;
use crate::types::{MatchmakerConfig, StageOutput};

/// Asks the model for meaningful product–trend pairings.
#[derive(Debug, Clone)]
pub struct MatchStage {
    settings: GenerationSettings,
    policy: IntegrityPolicy,
    deadline: Duration,
    max_matches: usize,
}

impl MatchStage {
    #[must_use]
    pub fn new(config: &MatchmakerConfig) -> Self {
        Self {
            settings: config.match_settings,
            policy: config.integrity_policy,
            deadline: config.stage_timeout,
            max_matches: config.max_matches.max(1),
        }
    }

    /// Pair `products` with `trends`.
    ///
    /// Either input being empty yields no matches without calling the model.
    /// An empty array from the model is a valid result.
    ///
    /// # Errors
    ///
    /// - [`MatchmakerError::Transport`] if the model call fails or times out.
    /// - [`MatchmakerError::Parse`] if the response is not a bare JSON array of matches.
    /// - [`MatchmakerError::Integrity`] if a match names an unknown product or
    ///   trend, or the count exceeds the limit, and the policy is
    ///   [`IntegrityPolicy::Reject`].
    pub async fn run<M: ModelClient>(
        &self,
        client: &M,
        products: &[Product],
        trends: &[TrendRecord],
    ) -> Result<StageOutput<Match>, MatchmakerError> {
        if products.is_empty() || trends.is_empty() {
            tracing::info!(
                products = products.len(),
                trends = trends.len(),
                "nothing to match; skipping model call"
            );
            return Ok(StageOutput::empty());
        }

        let request = ModelRequest {
            prompt: match_prompt(products, trends, self.max_matches)?,
            settings: self.settings,
        };

        let output = invoke_with_deadline(client, &request, self.deadline)
            .await
            .map_err(|source| MatchmakerError::Transport {
                stage: Stage::Match,
                source,
            })?;
        tracing::debug!(raw = %output.text, "match stage response");

        let decoded: Vec<Match> = decode_records(Stage::Match, &output.text)?;
        let proposed = decoded.len();
        let reconciled =
            reconcile_matches(products, trends, decoded, self.max_matches, self.policy)?;

        tracing::info!(
            proposed,
            accepted = reconciled.records.len(),
            "matching complete"
        );
        Ok(reconciled)
    }
}
