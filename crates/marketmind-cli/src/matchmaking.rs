//! Matchmaking and trend command handlers for the CLI.
//!
//! Successful runs print JSON on stdout. Pipeline failures print the stage,
//! failure kind, and any raw model output on stderr, then return an error so
//! the process exits non-zero.

use std::path::Path;

use anyhow::Context;
use marketmind_core::{AppConfig, Product, TrendRecord};
use marketmind_matchmaker::{MatchmakerError, PipelineOutcome};
use marketmind_trends::TrendsConfig;

/// Match products and trends read from JSON files.
///
/// # Errors
///
/// Returns an error if either file cannot be read or decoded, the pipeline
/// cannot be built, or a stage fails.
pub(crate) async fn run_match_files(
    config: &AppConfig,
    products_path: &Path,
    trends_path: &Path,
    max_matches: Option<usize>,
) -> anyhow::Result<()> {
    let products: Vec<Product> = read_json(products_path)?;
    let trends: Vec<TrendRecord> = read_json(trends_path)?;
    execute(config, &products, &trends, max_matches).await
}

/// Fetch trends and print them as JSON.
///
/// # Errors
///
/// Returns an error if every trend feed fails.
pub(crate) async fn run_trends(config: &AppConfig, limit: Option<usize>) -> anyhow::Result<()> {
    let trends = fetch(config, limit).await?;
    println!("{}", serde_json::to_string_pretty(&trends)?);
    Ok(())
}

/// Fetch trends, load the catalog, and run the pipeline.
///
/// # Errors
///
/// Returns an error if trends or products cannot be loaded, or a stage fails.
pub(crate) async fn run_full(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    limit: Option<i64>,
    max_matches: Option<usize>,
) -> anyhow::Result<()> {
    let trends = fetch(config, None).await?;
    let product_limit = limit.unwrap_or(config.product_limit);
    anyhow::ensure!(product_limit >= 1, "--limit must be at least 1");
    let products = marketmind_db::fetch_products(pool, product_limit).await?;
    tracing::info!(
        products = products.len(),
        trends = trends.len(),
        "loaded pipeline inputs"
    );
    execute(config, &products, &trends, max_matches).await
}

async fn fetch(config: &AppConfig, limit: Option<usize>) -> anyhow::Result<Vec<TrendRecord>> {
    let mut trends_config = TrendsConfig::from_app_config(config);
    if let Some(limit) = limit {
        trends_config.limit = limit;
    }
    marketmind_trends::fetch_trends(&trends_config)
        .await
        .context("trend discovery failed")
}

async fn execute(
    config: &AppConfig,
    products: &[Product],
    trends: &[TrendRecord],
    max_matches: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(max) = max_matches {
        anyhow::ensure!(max >= 1, "--max-matches must be at least 1");
        config.max_matches = max;
    }

    let pipeline = marketmind_matchmaker::gemini_pipeline(&config)
        .context("failed to build the Gemini pipeline")?;

    match pipeline.run(products, trends).await {
        Ok(outcome) => {
            print_outcome(&outcome, trends.len())?;
            Ok(())
        }
        Err(e) => {
            report_failure(&e);
            Err(e.into())
        }
    }
}

fn print_outcome(outcome: &PipelineOutcome, input_trends: usize) -> anyhow::Result<()> {
    for issue in &outcome.dropped {
        eprintln!("dropped: {} stage: {}", issue.stage, issue.detail);
    }
    for issue in &outcome.corrected {
        eprintln!("corrected: {} stage: {}", issue.stage, issue.detail);
    }
    eprintln!(
        "{} of {} trends passed the filter; {} match(es)",
        outcome.filtered_trends.len(),
        input_trends,
        outcome.matches.len()
    );
    println!("{}", serde_json::to_string_pretty(&outcome.matches)?);
    Ok(())
}

fn report_failure(error: &MatchmakerError) {
    match error.stage() {
        Some(stage) => eprintln!("error: {stage} stage failed ({})", error.kind()),
        None => eprintln!("error: pipeline failed ({})", error.kind()),
    }
    if let Some(raw) = error.raw_output() {
        eprintln!("raw model output:\n{raw}");
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("failed to decode {}", path.display()))
}
