use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CANCELED: &str = "canceled";

/// Application row joined with the job title for listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRecord {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub title: String,
    pub resume_id: Option<i64>,
    pub status: String,
    pub applied_at: DateTime<Utc>,
}
