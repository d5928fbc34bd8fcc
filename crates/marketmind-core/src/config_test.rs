use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MARKETMIND_ENV"));
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.database_url.is_none());
    assert!(cfg.gemini_api_key.is_none());
    assert_eq!(cfg.gemini_model, "gemini-2.5-flash");
    assert_eq!(
        cfg.gemini_base_url,
        "https://generativelanguage.googleapis.com"
    );
    assert_eq!(cfg.model_timeout_secs, 120);
    assert_eq!(cfg.model_max_retries, 0);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.max_matches, 10);
    assert_eq!(cfg.integrity_policy, IntegrityPolicy::Drop);
    assert_eq!(cfg.product_limit, 10);
    assert_eq!(cfg.trends_topics, vec!["WORLD", "TECHNOLOGY", "ENTERTAINMENT"]);
    assert_eq!(cfg.trends_limit, 20);
    assert_eq!(cfg.trends_language, "en-US");
    assert_eq!(cfg.trends_country, "US");
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "secret-key");
    map.insert("MARKETMIND_MAX_MATCHES", "3");
    map.insert("MARKETMIND_INTEGRITY_POLICY", "Reject");
    map.insert("MARKETMIND_MODEL_MAX_RETRIES", "2");
    map.insert("MARKETMIND_TRENDS_TOPICS", "business, sports ,");
    map.insert("MARKETMIND_TRENDS_LOCALE", "nl:nl");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.gemini_api_key.as_deref(), Some("secret-key"));
    assert_eq!(cfg.max_matches, 3);
    assert_eq!(cfg.integrity_policy, IntegrityPolicy::Reject);
    assert_eq!(cfg.model_max_retries, 2);
    assert_eq!(cfg.trends_topics, vec!["BUSINESS", "SPORTS"]);
    assert_eq!(cfg.trends_language, "nl");
    assert_eq!(cfg.trends_country, "NL");
}

#[test]
fn blank_api_key_is_treated_as_missing() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.gemini_api_key.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_BIND_ADDR"),
        "expected InvalidEnvVar(MARKETMIND_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn zero_max_matches_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_MAX_MATCHES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_MAX_MATCHES"),
        "expected InvalidEnvVar(MARKETMIND_MAX_MATCHES), got: {result:?}"
    );
}

#[test]
fn unknown_integrity_policy_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_INTEGRITY_POLICY", "ignore");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_INTEGRITY_POLICY"),
        "expected InvalidEnvVar(MARKETMIND_INTEGRITY_POLICY), got: {result:?}"
    );
}

#[test]
fn model_timeout_must_be_positive() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_MODEL_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_MODEL_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MARKETMIND_MODEL_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn malformed_locale_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_TRENDS_LOCALE", "en-US");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_TRENDS_LOCALE"),
        "expected InvalidEnvVar(MARKETMIND_TRENDS_LOCALE), got: {result:?}"
    );
}

#[test]
fn retries_must_be_numeric() {
    let mut map = HashMap::new();
    map.insert("MARKETMIND_MODEL_MAX_RETRIES", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MARKETMIND_MODEL_MAX_RETRIES"),
        "expected InvalidEnvVar(MARKETMIND_MODEL_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "super-secret");
    map.insert("DATABASE_URL", "postgres://user:pw@localhost/mm");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(!rendered.contains("user:pw"));
    assert!(rendered.contains("[redacted]"));
}
