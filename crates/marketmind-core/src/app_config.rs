use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What to do with model output that references data absent from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityPolicy {
    /// Remove offending records, log a warning, and keep the rest.
    #[default]
    Drop,
    /// Fail the stage on the first offending record.
    Reject,
}

impl std::fmt::Display for IntegrityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityPolicy::Drop => write!(f, "drop"),
            IntegrityPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub model_timeout_secs: u64,
    pub model_max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_matches: usize,
    pub integrity_policy: IntegrityPolicy,
    pub product_limit: i64,
    pub trends_topics: Vec<String>,
    pub trends_limit: usize,
    pub trends_language: String,
    pub trends_country: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("model_max_retries", &self.model_max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_matches", &self.max_matches)
            .field("integrity_policy", &self.integrity_policy)
            .field("product_limit", &self.product_limit)
            .field("trends_topics", &self.trends_topics)
            .field("trends_limit", &self.trends_limit)
            .field("trends_language", &self.trends_language)
            .field("trends_country", &self.trends_country)
            .finish()
    }
}
