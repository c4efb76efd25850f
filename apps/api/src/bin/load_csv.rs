//! Standalone CSV loader binary.
//!
//! Usage: `load-csv <jobs|locations|tags> <path.csv>`
//! Reads `DATABASE_URL` from the environment (or `.env`). Seed the lookup
//! tables first (`locations`, `tags`), then load `jobs`.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobboard_api::db::create_pool;
use jobboard_api::ingest::loader;
use jobboard_api::lookup::LookupCache;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(mode), Some(path)) = (args.next(), args.next()) else {
        bail!("Usage: load-csv <jobs|locations|tags> <path.csv>");
    };
    let path = PathBuf::from(path);

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool(&database_url).await?;

    match mode.as_str() {
        "locations" => {
            let inserted = loader::load_locations_csv(&pool, &path).await?;
            tracing::info!(inserted, "Locations loaded");
        }
        "tags" => {
            let inserted = loader::load_tags_csv(&pool, &path).await?;
            tracing::info!(inserted, "Tags loaded");
        }
        "jobs" => {
            let lookup = LookupCache::load(&pool).await?;
            let summary = loader::load_jobs_csv(&pool, &lookup, &path).await?;
            tracing::info!(
                inserted = summary.inserted,
                skipped = summary.skipped,
                "Jobs loaded"
            );
        }
        other => bail!("Unknown mode '{other}'. Use jobs, locations or tags."),
    }
    Ok(())
}
