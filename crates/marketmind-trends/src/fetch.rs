//! Concurrent fetching and merging of trend feeds.

use std::collections::HashSet;
use std::time::Duration;

use marketmind_core::TrendRecord;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use crate::error::TrendsError;
use crate::feed::parse_trend_feed;
use crate::TrendsConfig;

const TOP_STORIES_CATEGORY: &str = "Top Stories";

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedSource {
    category: String,
    url: String,
}

/// Fetch, merge and number trends from every configured feed.
///
/// Feeds are fetched concurrently. A feed that fails to download or parse
/// is logged and skipped. The merged list interleaves feeds so each topic
/// is represented before any one topic fills the limit, drops repeated
/// titles, and renumbers `trend_id` from `"1"`.
///
/// # Errors
///
/// - [`TrendsError::Config`] if no feeds are configured.
/// - [`TrendsError::Http`] if the HTTP client cannot be built.
/// - [`TrendsError::AllFeedsFailed`] if every feed failed.
pub async fn fetch_trends(config: &TrendsConfig) -> Result<Vec<TrendRecord>, TrendsError> {
    let sources = feed_sources(config)?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("marketmind/0.1 (trend-discovery)")
        .build()?;

    let results =
        futures::future::join_all(sources.iter().map(|s| fetch_feed(&client, s, config.limit)))
            .await;

    let mut batches = Vec::with_capacity(sources.len());
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(records) => {
                tracing::debug!(
                    category = %source.category,
                    count = records.len(),
                    "trend feed fetched"
                );
                batches.push(records);
            }
            Err(e) => {
                tracing::warn!(
                    category = %source.category,
                    url = %source.url,
                    error = %e,
                    "trend feed failed; skipping"
                );
            }
        }
    }

    if batches.is_empty() {
        return Err(TrendsError::AllFeedsFailed {
            attempted: sources.len(),
        });
    }

    let feeds = batches.len();
    let trends = merge_trends(batches, config.limit);
    tracing::info!(feeds, trends = trends.len(), "trend discovery complete");
    Ok(trends)
}

async fn fetch_feed(
    client: &Client,
    source: &FeedSource,
    limit: usize,
) -> Result<Vec<TrendRecord>, TrendsError> {
    let body = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_trend_feed(&body, &source.category, limit)
}

fn feed_sources(config: &TrendsConfig) -> Result<Vec<FeedSource>, TrendsError> {
    let base = config.base_url.trim_end_matches('/');
    let language = config
        .language
        .split('-')
        .next()
        .unwrap_or(config.language.as_str());
    let hl = utf8_percent_encode(&config.language, NON_ALPHANUMERIC);
    let gl = utf8_percent_encode(&config.country, NON_ALPHANUMERIC);
    let ceid = utf8_percent_encode(language, NON_ALPHANUMERIC);
    let query = format!("hl={hl}&gl={gl}&ceid={gl}:{ceid}");

    let mut sources = Vec::with_capacity(config.topics.len() + 1);
    if config.include_top_stories {
        sources.push(FeedSource {
            category: TOP_STORIES_CATEGORY.to_string(),
            url: format!("{base}/rss?{query}"),
        });
    }
    for topic in &config.topics {
        let topic = topic.trim();
        if topic.is_empty() {
            continue;
        }
        let encoded = utf8_percent_encode(topic, NON_ALPHANUMERIC);
        sources.push(FeedSource {
            category: category_label(topic),
            url: format!("{base}/rss/headlines/section/topic/{encoded}?{query}"),
        });
    }

    if sources.is_empty() {
        return Err(TrendsError::Config(
            "no topics configured and top stories disabled".to_string(),
        ));
    }
    Ok(sources)
}

/// `SCIENCE_AND_TECH` becomes `Science And Tech`.
fn category_label(topic: &str) -> String {
    topic
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Interleave batches, drop repeated titles, cap at `limit`, renumber ids.
fn merge_trends(batches: Vec<Vec<TrendRecord>>, limit: usize) -> Vec<TrendRecord> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut iters: Vec<_> = batches.into_iter().map(Vec::into_iter).collect();

    'outer: loop {
        let mut progressed = false;
        for iter in &mut iters {
            let Some(mut record) = iter.next() else {
                continue;
            };
            progressed = true;
            if !seen.insert(record.trend_title.to_lowercase()) {
                continue;
            }
            record.trend_id = (merged.len() + 1).to_string();
            merged.push(record);
            if merged.len() >= limit {
                break 'outer;
            }
        }
        if !progressed {
            break;
        }
    }
    merged
}
