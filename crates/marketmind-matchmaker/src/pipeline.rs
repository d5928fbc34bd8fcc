//! Matchmaking pipeline orchestration.

use marketmind_core::{Product, TrendRecord};
use tracing::Instrument;

use crate::error::{FailureKind, MatchmakerError};
use crate::filter::FilterStage;
use crate::matching::MatchStage;
use crate::model::ModelClient;
use crate::types::{MatchmakerConfig, PipelineOutcome};

/// Progress of one pipeline invocation.
///
/// `Idle → Filtering → Matching → Done`, with `Failed` reachable from
/// `Filtering` or `Matching`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Filtering,
    Matching,
    Done,
    Failed(FailureKind),
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Filtering => write!(f, "filtering"),
            PipelineState::Matching => write!(f, "matching"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

impl PipelineState {
    /// Move to `next`, rejecting transitions the state machine does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`MatchmakerError::InvalidTransition`] for an illegal move.
    pub fn advance(self, next: PipelineState) -> Result<PipelineState, MatchmakerError> {
        let allowed = matches!(
            (self, next),
            (PipelineState::Idle, PipelineState::Filtering)
                | (PipelineState::Filtering, PipelineState::Matching)
                | (PipelineState::Matching, PipelineState::Done)
                | (
                    PipelineState::Filtering | PipelineState::Matching,
                    PipelineState::Failed(_)
                )
        );
        if !allowed {
            return Err(MatchmakerError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %self, to = %next, "pipeline transition");
        Ok(next)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Filter-then-match pipeline over an injected model client.
///
/// Holds no mutable state; one `Pipeline` can serve concurrent runs.
pub struct Pipeline<M> {
    client: M,
    config: MatchmakerConfig,
    filter: FilterStage,
    matcher: MatchStage,
}

impl<M: ModelClient> Pipeline<M> {
    #[must_use]
    pub fn new(client: M, config: MatchmakerConfig) -> Self {
        let filter = FilterStage::new(&config);
        let matcher = MatchStage::new(&config);
        Self {
            client,
            config,
            filter,
            matcher,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MatchmakerConfig {
        &self.config
    }

    /// Run the filter stage, then the match stage, each exactly once.
    ///
    /// 1. Filter `trends` against the sensitive-topic policy.
    /// 2. Match `products` against the surviving trends.
    ///
    /// Returns the filtered trends and the matches; the match list may be
    /// empty. Dropping the returned future cancels any in-flight model call.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure as a [`MatchmakerError`] naming the
    /// stage and failure kind. No stage is retried here; transient transport
    /// retries belong to the client (see [`crate::RetryingClient`]).
    pub async fn run(
        &self,
        products: &[Product],
        trends: &[TrendRecord],
    ) -> Result<PipelineOutcome, MatchmakerError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("matchmaker", %run_id);
        self.run_inner(products, trends).instrument(span).await
    }

    async fn run_inner(
        &self,
        products: &[Product],
        trends: &[TrendRecord],
    ) -> Result<PipelineOutcome, MatchmakerError> {
        tracing::info!(
            products = products.len(),
            trends = trends.len(),
            "starting matchmaker pipeline"
        );

        let state = PipelineState::Idle.advance(PipelineState::Filtering)?;
        let filtered = match self.filter.run(&self.client, trends).await {
            Ok(filtered) => filtered,
            Err(e) => return Err(fail(state, e)),
        };

        let state = state.advance(PipelineState::Matching)?;
        let matched = match self
            .matcher
            .run(&self.client, products, &filtered.records)
            .await
        {
            Ok(matched) => matched,
            Err(e) => return Err(fail(state, e)),
        };

        let final_state = state.advance(PipelineState::Done)?;

        let mut dropped = filtered.dropped;
        dropped.extend(matched.dropped);
        let mut corrected = filtered.corrected;
        corrected.extend(matched.corrected);

        tracing::info!(
            filtered_trends = filtered.records.len(),
            matches = matched.records.len(),
            dropped = dropped.len(),
            corrected = corrected.len(),
            "matchmaker pipeline complete"
        );

        Ok(PipelineOutcome {
            filtered_trends: filtered.records,
            matches: matched.records,
            dropped,
            corrected,
            final_state,
        })
    }
}

/// Record the failure transition and hand the stage error back.
fn fail(state: PipelineState, error: MatchmakerError) -> MatchmakerError {
    let kind = error.kind();
    if let Err(transition) = state.advance(PipelineState::Failed(kind)) {
        tracing::error!(error = %transition, "failure raised outside a running stage");
    }
    match error.raw_output() {
        Some(raw) => tracing::error!(
            stage = ?error.stage(),
            kind = %kind,
            error = %error,
            raw_output = %raw,
            "matchmaker pipeline failed"
        ),
        None => tracing::error!(
            stage = ?error.stage(),
            kind = %kind,
            error = %error,
            "matchmaker pipeline failed"
        ),
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        let state = PipelineState::Idle
            .advance(PipelineState::Filtering)
            .and_then(|s| s.advance(PipelineState::Matching))
            .and_then(|s| s.advance(PipelineState::Done))
            .expect("legal path");
        assert_eq!(state, PipelineState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn failure_is_reachable_from_both_stages() {
        let kind = FailureKind::ParseFailure;
        assert!(PipelineState::Filtering
            .advance(PipelineState::Failed(kind))
            .is_ok());
        assert!(PipelineState::Matching
            .advance(PipelineState::Failed(kind))
            .is_ok());
    }

    #[test]
    fn skipping_the_filter_is_rejected() {
        let err = PipelineState::Idle
            .advance(PipelineState::Matching)
            .unwrap_err();
        assert!(matches!(err, MatchmakerError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_states_do_not_advance() {
        assert!(PipelineState::Done
            .advance(PipelineState::Filtering)
            .is_err());
        assert!(PipelineState::Failed(FailureKind::TransportFailure)
            .advance(PipelineState::Matching)
            .is_err());
        assert!(PipelineState::Idle
            .advance(PipelineState::Failed(FailureKind::ParseFailure))
            .is_err());
    }

    #[test]
    fn failed_state_displays_kind() {
        assert_eq!(
            PipelineState::Failed(FailureKind::ParseFailure).to_string(),
            "failed(parse_failure)"
        );
    }
}
