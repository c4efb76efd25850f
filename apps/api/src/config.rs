use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    /// Access token lifetime in minutes. Default 15.
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime in days. Default 7.
    pub refresh_token_ttl_days: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_access_secret: require_env("JWT_ACCESS_SECRET")?,
            jwt_refresh_secret: require_env("JWT_REFRESH_SECRET")?,
            access_token_ttl_minutes: env_or("ACCESS_TOKEN_TTL_MINUTES", "15")
                .parse::<i64>()
                .context("ACCESS_TOKEN_TTL_MINUTES must be a number of minutes")?,
            refresh_token_ttl_days: env_or("REFRESH_TOKEN_TTL_DAYS", "7")
                .parse::<i64>()
                .context("REFRESH_TOKEN_TTL_DAYS must be a number of days")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
