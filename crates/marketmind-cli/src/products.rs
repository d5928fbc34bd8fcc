//! Product catalog command handlers.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use marketmind_core::{AppConfig, Product};

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub enum ProductsCommands {
    /// Print catalog products as JSON
    List {
        /// Override MARKETMIND_PRODUCT_LIMIT
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Upsert products from a JSON array file
    Import {
        /// JSON array of products
        file: PathBuf,
    },
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: ProductsCommands,
) -> anyhow::Result<()> {
    match command {
        ProductsCommands::List { limit } => {
            let limit = limit.unwrap_or(config.product_limit);
            anyhow::ensure!(limit >= 1, "--limit must be at least 1");
            let products = marketmind_db::fetch_products(pool, limit).await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        ProductsCommands::Import { file } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let products: Vec<Product> = serde_json::from_str(&body)
                .with_context(|| format!("failed to decode {}", file.display()))?;
            let written = marketmind_db::import_products(pool, &products).await?;
            tracing::info!(written, file = %file.display(), "imported products");
            println!("imported {written} product(s)");
        }
    }
    Ok(())
}
