use std::time::Duration;

use marketmind_core::{AppConfig, IntegrityPolicy, Match, TrendRecord, DEFAULT_MAX_MATCHES};
use serde::Serialize;

use crate::error::Stage;
use crate::model::GenerationSettings;
use crate::pipeline::PipelineState;
use crate::retry::retry_budget;

/// Low temperature keeps the filter from paraphrasing records it keeps.
pub const FILTER_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.1,
    max_output_tokens: 1000,
};

pub const MATCH_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.3,
    max_output_tokens: 2000,
};

const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;

/// Settings for one [`crate::Pipeline`].
#[derive(Debug, Clone)]
pub struct MatchmakerConfig {
    /// Upper bound on matches returned by one run. Always at least 1.
    pub max_matches: usize,
    pub integrity_policy: IntegrityPolicy,
    /// Deadline for each stage's model call, retries included.
    pub stage_timeout: Duration,
    pub filter_settings: GenerationSettings,
    pub match_settings: GenerationSettings,
}

impl Default for MatchmakerConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
            integrity_policy: IntegrityPolicy::Drop,
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            filter_settings: FILTER_SETTINGS,
            match_settings: MATCH_SETTINGS,
        }
    }
}

impl MatchmakerConfig {
    /// The stage deadline spans every retry the configured policy can make,
    /// each attempt bounded by `model_timeout_secs`.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_matches: config.max_matches.max(1),
            integrity_policy: config.integrity_policy,
            stage_timeout: retry_budget(
                Duration::from_secs(config.model_timeout_secs),
                config.model_max_retries,
                config.retry_backoff_base_ms,
            ),
            ..Self::default()
        }
    }
}

/// A note from the integrity checks: a record removed, or a record repaired and kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub stage: Stage,
    pub detail: String,
}

/// Records produced by one stage plus what its integrity check removed or repaired.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub records: Vec<T>,
    /// Records removed under [`IntegrityPolicy::Drop`].
    pub dropped: Vec<IntegrityIssue>,
    /// Records kept after a repair: input order or a trend description restored.
    pub corrected: Vec<IntegrityIssue>,
}

impl<T> StageOutput<T> {
    pub(crate) fn empty() -> Self {
        Self {
            records: Vec::new(),
            dropped: Vec::new(),
            corrected: Vec::new(),
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Trends that survived the sensitive-content filter, in input order.
    pub filtered_trends: Vec<TrendRecord>,
    /// At most `max_matches` entries; empty when nothing qualified.
    pub matches: Vec<Match>,
    pub dropped: Vec<IntegrityIssue>,
    pub corrected: Vec<IntegrityIssue>,
    pub final_state: PipelineState,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn app_config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        marketmind_core::build_app_config(|key| map.get(key).cloned().ok_or(VarError::NotPresent))
            .expect("config should build")
    }

    #[test]
    fn stage_timeout_equals_model_timeout_without_retries() {
        let config = MatchmakerConfig::from_app_config(&app_config(&[(
            "MARKETMIND_MODEL_TIMEOUT_SECS",
            "30",
        )]));
        assert_eq!(config.stage_timeout, Duration::from_secs(30));
    }

    #[test]
    fn stage_timeout_leaves_room_for_configured_retries() {
        let config = MatchmakerConfig::from_app_config(&app_config(&[
            ("MARKETMIND_MODEL_TIMEOUT_SECS", "30"),
            ("MARKETMIND_MODEL_MAX_RETRIES", "2"),
            ("MARKETMIND_RETRY_BACKOFF_BASE_MS", "1000"),
        ]));
        assert!(config.stage_timeout >= Duration::from_secs(90));
        assert_eq!(
            config.stage_timeout,
            retry_budget(Duration::from_secs(30), 2, 1_000)
        );
    }
}
