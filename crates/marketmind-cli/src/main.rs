mod matchmaking;
mod products;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::products::ProductsCommands;

#[derive(Debug, Parser)]
#[command(name = "marketmind-cli")]
#[command(about = "Market Mind product-trend matchmaking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the filter and match stages over JSON files
    Match {
        /// JSON array of products
        #[arg(long)]
        products: PathBuf,

        /// JSON array of trend records
        #[arg(long)]
        trends: PathBuf,

        /// Override MARKETMIND_MAX_MATCHES
        #[arg(long)]
        max_matches: Option<usize>,
    },
    /// Fetch current trends from the news feeds and print them
    Trends {
        /// Override MARKETMIND_TRENDS_LIMIT
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch trends, read products from the catalog, and match them
    Run {
        /// Override MARKETMIND_PRODUCT_LIMIT
        #[arg(long)]
        limit: Option<i64>,

        /// Override MARKETMIND_MAX_MATCHES
        #[arg(long)]
        max_matches: Option<usize>,
    },
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = marketmind_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Match {
            products,
            trends,
            max_matches,
        }) => {
            matchmaking::run_match_files(&config, &products, &trends, max_matches).await?;
        }
        Some(Commands::Trends { limit }) => matchmaking::run_trends(&config, limit).await?,
        Some(Commands::Run { limit, max_matches }) => {
            let pool = connect(&config).await?;
            matchmaking::run_full(&pool, &config, limit, max_matches).await?;
        }
        Some(Commands::Products { command }) => {
            let pool = connect(&config).await?;
            products::run(&pool, &config, command).await?;
        }
        Some(Commands::Db { command }) => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    marketmind_db::ping(&pool).await?;
                    println!("database reachable");
                }
                DbCommands::Migrate => {
                    let applied = marketmind_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        None => println!("marketmind-cli ready; run with --help for commands"),
    }

    Ok(())
}

async fn connect(config: &marketmind_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    Ok(marketmind_db::connect_pool_from_config(config).await?)
}
