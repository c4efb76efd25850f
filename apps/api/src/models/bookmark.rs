use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Favorite row joined with job and company for the bookmark list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookmarkRecord {
    pub bookmark_id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub title: String,
    pub company_name: String,
    pub salary: Option<String>,
    pub deadline: Option<NaiveDate>,
}
