//! Trend discovery from Google News RSS feeds.
//!
//! Fetches the top-stories feed and one feed per configured topic, turns
//! each `<item>` into a [`marketmind_core::TrendRecord`], deduplicates by
//! title and numbers the result.

pub mod error;
pub mod feed;
pub mod fetch;

pub use error::TrendsError;
pub use feed::{parse_trend_feed, strip_html};
pub use fetch::fetch_trends;

use marketmind_core::AppConfig;

pub const DEFAULT_BASE_URL: &str = "https://news.google.com";

/// Where and how many trends to fetch.
#[derive(Debug, Clone)]
pub struct TrendsConfig {
    /// Google News topic identifiers, e.g. `TECHNOLOGY`.
    pub topics: Vec<String>,
    pub include_top_stories: bool,
    /// Maximum number of trends returned after deduplication.
    pub limit: usize,
    /// `hl` query value, e.g. `en-US`.
    pub language: String,
    /// `gl` query value, e.g. `US`.
    pub country: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            topics: vec![
                "WORLD".to_string(),
                "TECHNOLOGY".to_string(),
                "ENTERTAINMENT".to_string(),
            ],
            include_top_stories: true,
            limit: 20,
            language: "en-US".to_string(),
            country: "US".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl TrendsConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            topics: config.trends_topics.clone(),
            limit: config.trends_limit,
            language: config.trends_language.clone(),
            country: config.trends_country.clone(),
            ..Self::default()
        }
    }
}
