//! Strict JSON-array codec for stage boundaries.
//!
//! Decoding is all-or-nothing: the whole response (ignoring surrounding
//! whitespace) must be one JSON array whose every element decodes into the
//! target record. Prose, code fences, trailing text, or a single record
//! missing a required field fail the whole decode.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MatchmakerError, Stage};

/// Serialize records into the compact JSON array embedded in prompts.
///
/// # Errors
///
/// Returns [`MatchmakerError::Encode`] if serialization fails.
pub fn encode_records<T: Serialize>(
    what: &'static str,
    records: &[T],
) -> Result<String, MatchmakerError> {
    serde_json::to_string(records).map_err(|source| MatchmakerError::Encode { what, source })
}

/// Decode a model response into a record array.
///
/// # Errors
///
/// Returns [`MatchmakerError::Parse`] carrying the full response text if the
/// response is anything other than a JSON array of valid records.
pub fn decode_records<T: DeserializeOwned>(
    stage: Stage,
    raw: &str,
) -> Result<Vec<T>, MatchmakerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(parse_failure(stage, "response is empty", raw));
    }

    serde_json::from_str::<Vec<T>>(trimmed).map_err(|e| {
        let reason = diagnose(trimmed, &e);
        parse_failure(stage, &reason, raw)
    })
}

fn parse_failure(stage: Stage, reason: &str, raw: &str) -> MatchmakerError {
    MatchmakerError::Parse {
        stage,
        reason: reason.to_string(),
        raw: raw.to_string(),
    }
}

/// Prefer a human-readable reason for the common ways models break format.
fn diagnose(trimmed: &str, err: &serde_json::Error) -> String {
    if trimmed.starts_with("```") {
        return "response is wrapped in a markdown code fence".to_string();
    }
    if !trimmed.starts_with('[') {
        return format!("response does not start with a JSON array ({err})");
    }
    err.to_string()
}

#[cfg(test)]
mod tests {
    use marketmind_core::{Match, TrendRecord};

    use super::*;

    const ONE_MATCH: &str = r#"[{"product_name":"Bananas","trend_title":"Cat Wins Local Election","trend_description":"A cat named Whiskers wins.","similarity_description":"Going bananas for the new mayor."}]"#;

    #[test]
    fn decodes_bare_array() {
        let matches: Vec<Match> = decode_records(Stage::Match, ONE_MATCH).expect("decode");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].product_name, "Bananas");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let raw = format!("\n  {ONE_MATCH}\n\n");
        let matches: Vec<Match> = decode_records(Stage::Match, &raw).expect("decode");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn empty_array_is_success_not_failure() {
        let matches: Vec<Match> = decode_records(Stage::Match, "[]").expect("decode");
        assert!(matches.is_empty());
    }

    #[test]
    fn code_fence_is_a_parse_failure() {
        let raw = format!("```json\n{ONE_MATCH}\n```");
        let err = decode_records::<Match>(Stage::Match, &raw).unwrap_err();
        match err {
            MatchmakerError::Parse {
                stage,
                reason,
                raw: kept,
            } => {
                assert_eq!(stage, Stage::Match);
                assert!(reason.contains("code fence"), "reason: {reason}");
                assert_eq!(kept, raw);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn leading_prose_is_a_parse_failure() {
        let raw = format!("Here you go: {ONE_MATCH}");
        let err = decode_records::<Match>(Stage::Match, &raw).unwrap_err();
        assert!(matches!(err, MatchmakerError::Parse { .. }));
    }

    #[test]
    fn trailing_garbage_is_not_partially_decoded() {
        let raw = format!("{ONE_MATCH} and that's all!");
        let err = decode_records::<Match>(Stage::Match, &raw).unwrap_err();
        assert!(matches!(err, MatchmakerError::Parse { .. }));
    }

    #[test]
    fn truncated_array_is_a_parse_failure() {
        let raw = &ONE_MATCH[..ONE_MATCH.len() - 10];
        let err = decode_records::<Match>(Stage::Match, raw).unwrap_err();
        assert_eq!(err.raw_output(), Some(raw));
    }

    #[test]
    fn record_missing_required_field_fails_whole_decode() {
        let raw = r#"[
            {"trend_id":"1","trend_title":"a","trend_description":"b","trend_category":"c"},
            {"trend_id":"2","trend_title":"d","trend_category":"e"}
        ]"#;
        let err = decode_records::<TrendRecord>(Stage::Filter, raw).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Filter));
    }

    #[test]
    fn whitespace_only_response_is_a_parse_failure() {
        let err = decode_records::<Match>(Stage::Match, "   \n").unwrap_err();
        assert!(matches!(err, MatchmakerError::Parse { ref reason, .. } if reason == "response is empty"));
    }

    #[test]
    fn json_object_instead_of_array_is_a_parse_failure() {
        let err = decode_records::<Match>(Stage::Match, r#"{"matches":[]}"#).unwrap_err();
        assert!(matches!(err, MatchmakerError::Parse { .. }));
    }

    #[test]
    fn encode_produces_compact_array() {
        let trends = vec![TrendRecord {
            trend_id: "1".to_string(),
            trend_title: "t".to_string(),
            trend_description: "d".to_string(),
            trend_category: "c".to_string(),
            search_volume: None,
        }];
        let json = encode_records("trends", &trends).expect("encode");
        assert_eq!(
            json,
            r#"[{"trend_id":"1","trend_title":"t","trend_description":"d","trend_category":"c"}]"#
        );
    }
}
