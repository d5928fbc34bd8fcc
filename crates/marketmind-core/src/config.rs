use crate::app_config::{AppConfig, Environment, IntegrityPolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("MARKETMIND_ENV", "development"))?;

    let bind_addr = or_default("MARKETMIND_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("MARKETMIND_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("MARKETMIND_LOG_LEVEL", "info");

    let database_url = optional("DATABASE_URL");
    let db_max_connections = parse_u32("MARKETMIND_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MARKETMIND_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MARKETMIND_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("MARKETMIND_GEMINI_MODEL", "gemini-2.5-flash");
    let gemini_base_url = or_default(
        "MARKETMIND_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let model_timeout_secs = parse_u64("MARKETMIND_MODEL_TIMEOUT_SECS", "120")?;
    if model_timeout_secs == 0 {
        return Err(invalid(
            "MARKETMIND_MODEL_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let model_max_retries = parse_u32("MARKETMIND_MODEL_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("MARKETMIND_RETRY_BACKOFF_BASE_MS", "1000")?;

    let max_matches = parse_usize("MARKETMIND_MAX_MATCHES", "10")?;
    if max_matches == 0 {
        return Err(invalid(
            "MARKETMIND_MAX_MATCHES",
            "must be at least 1".to_string(),
        ));
    }
    let integrity_policy = parse_integrity_policy(&or_default("MARKETMIND_INTEGRITY_POLICY", "drop"))?;

    let product_limit = or_default("MARKETMIND_PRODUCT_LIMIT", "10")
        .parse::<i64>()
        .map_err(|e| invalid("MARKETMIND_PRODUCT_LIMIT", e.to_string()))?;
    if product_limit < 1 {
        return Err(invalid(
            "MARKETMIND_PRODUCT_LIMIT",
            "must be at least 1".to_string(),
        ));
    }

    let trends_topics: Vec<String> =
        or_default("MARKETMIND_TRENDS_TOPICS", "WORLD,TECHNOLOGY,ENTERTAINMENT")
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
    let trends_limit = parse_usize("MARKETMIND_TRENDS_LIMIT", "20")?;
    let (trends_language, trends_country) =
        parse_locale(&or_default("MARKETMIND_TRENDS_LOCALE", "en-US:US"))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        model_timeout_secs,
        model_max_retries,
        retry_backoff_base_ms,
        max_matches,
        integrity_policy,
        product_limit,
        trends_topics,
        trends_limit,
        trends_language,
        trends_country,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MARKETMIND_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_integrity_policy(s: &str) -> Result<IntegrityPolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "drop" => Ok(IntegrityPolicy::Drop),
        "reject" => Ok(IntegrityPolicy::Reject),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MARKETMIND_INTEGRITY_POLICY".to_string(),
            reason: format!("expected 'drop' or 'reject', got '{other}'"),
        }),
    }
}

/// Split an `hl:gl` pair such as `en-US:US`.
fn parse_locale(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once(':') {
        Some((hl, gl)) if !hl.trim().is_empty() && !gl.trim().is_empty() => {
            Ok((hl.trim().to_string(), gl.trim().to_uppercase()))
        }
        _ => Err(ConfigError::InvalidEnvVar {
            var: "MARKETMIND_TRENDS_LOCALE".to_string(),
            reason: format!("expected '<language>:<country>', got '{s}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
