//! Source-closure checks on decoded model output.
//!
//! The filter stage may only delete records; the match stage may only
//! reference products and trends it was given, and may not exceed the
//! configured match count. Under [`IntegrityPolicy::Reject`] the first
//! violation fails the stage; under [`IntegrityPolicy::Drop`] offending
//! records are removed and reported. Repairs that keep a record (restoring
//! input order, restoring a trend description) are reported separately as
//! corrections.

use std::collections::HashSet;

use marketmind_core::{IntegrityPolicy, Match, Product, TrendRecord};

use crate::error::{MatchmakerError, Stage};
use crate::types::{IntegrityIssue, StageOutput};

/// Reconcile filter output against its input.
///
/// The returned records are always a subsequence of `input`, each equal to
/// the input record it came from.
///
/// # Errors
///
/// Under [`IntegrityPolicy::Reject`], returns [`MatchmakerError::Integrity`]
/// if any output record is absent from the input, duplicated, or out of order.
pub fn reconcile_filtered(
    input: &[TrendRecord],
    output: Vec<TrendRecord>,
    policy: IntegrityPolicy,
) -> Result<StageOutput<TrendRecord>, MatchmakerError> {
    let mut result = StageOutput::empty();
    let mut kept = Vec::with_capacity(output.len());

    for record in output {
        if input.contains(&record) {
            kept.push(record);
        } else {
            let detail = format!(
                "trend '{}' (id {}) is not an unmodified input record",
                record.trend_title, record.trend_id
            );
            violation(Stage::Filter, detail, policy, &mut result.dropped)?;
        }
    }

    if !is_subsequence(&kept, input) {
        let detail = "filtered records are duplicated or out of input order".to_string();
        match policy {
            IntegrityPolicy::Reject => {
                return Err(MatchmakerError::Integrity {
                    stage: Stage::Filter,
                    detail,
                });
            }
            IntegrityPolicy::Drop => correction(
                Stage::Filter,
                format!("{detail}; restored input order"),
                &mut result.corrected,
            ),
        }
    }

    // Project back onto input order so callers always see a true subsequence.
    result.records = input
        .iter()
        .filter(|record| kept.contains(record))
        .cloned()
        .collect();

    Ok(result)
}

/// Reconcile match output against the products and filtered trends it was built from.
///
/// A match cites a trend by title. When its description equals the
/// description of any filtered trend with that title it is kept as is;
/// otherwise the description is replaced with that of the first trend
/// bearing the title and the repair is reported as a correction. Description
/// mismatches never fail the stage.
///
/// # Errors
///
/// Under [`IntegrityPolicy::Reject`], returns [`MatchmakerError::Integrity`]
/// on the first match naming an unknown product or trend, or when the
/// output exceeds `max_matches`.
pub fn reconcile_matches(
    products: &[Product],
    trends: &[TrendRecord],
    output: Vec<Match>,
    max_matches: usize,
    policy: IntegrityPolicy,
) -> Result<StageOutput<Match>, MatchmakerError> {
    let product_names: HashSet<&str> = products.iter().map(|p| p.product_name.as_str()).collect();
    let mut result = StageOutput::empty();

    for mut candidate in output {
        if !product_names.contains(candidate.product_name.as_str()) {
            let detail = format!(
                "match references unknown product '{}'",
                candidate.product_name
            );
            violation(Stage::Match, detail, policy, &mut result.dropped)?;
            continue;
        }

        let mut titled = trends
            .iter()
            .filter(|t| t.trend_title == candidate.trend_title)
            .peekable();
        let Some(&first) = titled.peek() else {
            let detail = format!(
                "match references trend '{}' which is not in the filtered trends",
                candidate.trend_title
            );
            violation(Stage::Match, detail, policy, &mut result.dropped)?;
            continue;
        };

        if !titled.any(|t| t.trend_description == candidate.trend_description) {
            let detail = format!(
                "match for trend '{}' rewrote its description; restored the source text",
                candidate.trend_title
            );
            correction(Stage::Match, detail, &mut result.corrected);
            candidate.trend_description.clone_from(&first.trend_description);
        }

        result.records.push(candidate);
    }

    if result.records.len() > max_matches {
        let detail = format!(
            "model returned {} matches, more than the limit of {max_matches}",
            result.records.len()
        );
        violation(Stage::Match, detail, policy, &mut result.dropped)?;
        result.records.truncate(max_matches);
    }

    Ok(result)
}

/// Note a repair that kept the record.
fn correction(stage: Stage, detail: String, corrected: &mut Vec<IntegrityIssue>) {
    tracing::warn!(stage = %stage, detail = %detail, "corrected model output");
    corrected.push(IntegrityIssue { stage, detail });
}

/// Fail under `Reject`, record and continue under `Drop`.
fn violation(
    stage: Stage,
    detail: String,
    policy: IntegrityPolicy,
    dropped: &mut Vec<IntegrityIssue>,
) -> Result<(), MatchmakerError> {
    match policy {
        IntegrityPolicy::Reject => Err(MatchmakerError::Integrity { stage, detail }),
        IntegrityPolicy::Drop => {
            tracing::warn!(stage = %stage, detail = %detail, "dropping model output that failed integrity check");
            dropped.push(IntegrityIssue { stage, detail });
            Ok(())
        }
    }
}

/// `true` if `needle` can be obtained from `haystack` by deleting elements.
fn is_subsequence<T: PartialEq>(needle: &[T], haystack: &[T]) -> bool {
    let mut remaining = haystack.iter();
    needle
        .iter()
        .all(|wanted| remaining.any(|candidate| candidate == wanted))
}
