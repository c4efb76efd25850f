//! Standalone crawler binary.
//!
//! Usage: `crawl [keyword] [pages] [output.csv]`
//! Defaults: keyword `python`, 5 pages, `jobs.csv`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobboard_api::ingest::crawler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let keyword = args.next().unwrap_or_else(|| "python".to_string());
    let pages: u32 = args
        .next()
        .map(|p| p.parse())
        .transpose()
        .context("pages must be a number")?
        .unwrap_or(5);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "jobs.csv".to_string()));

    let today = chrono::Local::now().date_naive();
    let listings = crawler::crawl(&keyword, pages, today).await?;
    tracing::info!(count = listings.len(), "Crawl finished");

    crawler::write_csv(&listings, &output)?;
    tracing::info!(path = %output.display(), "Wrote CSV");
    Ok(())
}
