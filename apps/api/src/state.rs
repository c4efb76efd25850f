use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::lookup::LookupCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Location and tag id lookups, loaded once at startup. See `lookup.rs`
    /// for the refresh points.
    pub lookup: Arc<LookupCache>,
}
