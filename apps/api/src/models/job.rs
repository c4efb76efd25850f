use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// List-shaped job row: what `/jobs`, `/jobs/search`, `/jobs/filter` and
/// `/jobs/sort` return per item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    pub company_name: String,
    pub salary: Option<String>,
    pub deadline: Option<NaiveDate>,
}

/// Flat row backing the job detail view, before nesting company/location.
#[derive(Debug, Clone, FromRow)]
pub struct JobDetailRow {
    pub id: i64,
    pub title: String,
    pub salary: Option<String>,
    pub career: Option<String>,
    pub education: Option<String>,
    pub employment: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub link: Option<String>,
    pub views: i64,
    pub company_name: String,
    pub company_link: Option<String>,
    pub region: String,
    pub district: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyInfo {
    pub name: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationInfo {
    pub region: String,
    pub district: String,
}

/// Nested job detail returned by `GET /jobs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub id: i64,
    pub title: String,
    pub salary: Option<String>,
    pub career: Option<String>,
    pub education: Option<String>,
    pub employment: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub link: Option<String>,
    pub company: CompanyInfo,
    pub location: LocationInfo,
    pub views: i64,
    pub tags: Vec<String>,
}

impl JobDetail {
    pub fn from_row(row: JobDetailRow, views: i64, tags: Vec<String>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            salary: row.salary,
            career: row.career,
            education: row.education,
            employment: row.employment,
            deadline: row.deadline,
            link: row.link,
            company: CompanyInfo {
                name: row.company_name,
                link: row.company_link,
            },
            location: LocationInfo {
                region: row.region,
                district: row.district,
            },
            views,
            tags,
        }
    }
}
