use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query as MultiQuery;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use crate::errors::AppError;
use crate::ingest::normalize;
use crate::jobs::upsert;
use crate::models::job::{JobDetail, JobDetailRow, JobSummary};
use crate::response::{ApiResponse, PageParams, Pagination};
use crate::state::AppState;

/// GET /jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<JobSummary>>>, AppError> {
    let jobs: Vec<JobSummary> = sqlx::query_as(
        "SELECT j.id, j.title, c.name AS company_name, j.salary, j.deadline
         FROM jobs j
         JOIN companies c ON j.company_id = c.id
         ORDER BY j.id ASC
         LIMIT $1 OFFSET $2",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total = jobs.len();
    Ok(Json(ApiResponse::paginated(jobs, Pagination::of(&page, total))))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

/// GET /jobs/search
///
/// Substring match on job title or company name.
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<JobSummary>>>, AppError> {
    let keyword = params
        .keyword
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Keyword is required for search".to_string()))?;

    let pattern = format!("%{keyword}%");
    let jobs: Vec<JobSummary> = sqlx::query_as(
        "SELECT j.id, j.title, c.name AS company_name, j.salary, j.deadline
         FROM jobs j
         JOIN companies c ON j.company_id = c.id
         WHERE j.title ILIKE $1 OR c.name ILIKE $1
         ORDER BY j.id ASC
         LIMIT $2 OFFSET $3",
    )
    .bind(&pattern)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let mut response = {
        let total = jobs.len();
        ApiResponse::paginated(jobs, Pagination::of(&page, total))
    };
    if response.data.as_ref().is_some_and(|d| d.is_empty()) {
        response = response.with_message("No jobs found for the given keyword");
    }
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub tag: Vec<String>,
}

/// GET /jobs/filter
///
/// Both filter categories must resolve through the lookup cache; if either
/// side comes up empty the result is an empty success, not an error.
pub async fn filter_jobs(
    State(state): State<AppState>,
    MultiQuery(filter): MultiQuery<FilterParams>,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<JobSummary>>>, AppError> {
    if filter.location.is_empty() && filter.tag.is_empty() {
        return Err(AppError::Validation(
            "At least one location or tag must be provided.".to_string(),
        ));
    }

    let location_ids = state.lookup.resolve_locations(&filter.location).await;
    let tag_ids = state.lookup.resolve_tags(&filter.tag).await;

    if location_ids.is_empty() || tag_ids.is_empty() {
        return Ok(Json(
            ApiResponse::paginated(Vec::new(), Pagination::of(&page, 0))
                .with_message("No jobs found with the given filters."),
        ));
    }

    let jobs: Vec<JobSummary> = sqlx::query_as(
        "SELECT DISTINCT j.id, j.title, c.name AS company_name, j.salary, j.deadline
         FROM jobs j
         JOIN companies c ON j.company_id = c.id
         LEFT JOIN job_tags jt ON j.id = jt.job_id
         WHERE j.location_id = ANY($1) AND jt.tag_id = ANY($2)
         ORDER BY j.id ASC
         LIMIT $3 OFFSET $4",
    )
    .bind(&location_ids)
    .bind(&tag_ids)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let mut response = {
        let total = jobs.len();
        ApiResponse::paginated(jobs, Pagination::of(&page, total))
    };
    if response.data.as_ref().is_some_and(|d| d.is_empty()) {
        response = response.with_message("No jobs found with the given filters.");
    }
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SortParams {
    pub order: Option<String>,
}

/// GET /jobs/sort
///
/// Orders by deadline; sentinel far-future deadlines sort after literal dates.
pub async fn sort_jobs(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<JobSummary>>>, AppError> {
    let direction = match params.order.as_deref().unwrap_or("asc") {
        "asc" => "ASC",
        "desc" => "DESC",
        _ => {
            return Err(AppError::Validation(
                "Invalid order. Valid values are 'asc' or 'desc'.".to_string(),
            ))
        }
    };

    // Direction is validated above, never interpolated from raw input.
    let sql = format!(
        "SELECT j.id, j.title, c.name AS company_name, j.salary, j.deadline
         FROM jobs j
         JOIN companies c ON j.company_id = c.id
         ORDER BY j.deadline {direction}
         LIMIT $1 OFFSET $2"
    );
    let jobs: Vec<JobSummary> = sqlx::query_as(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&state.db)
        .await?;

    let total = jobs.len();
    Ok(Json(ApiResponse::paginated(jobs, Pagination::of(&page, total))))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_link: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub career: Option<String>,
    pub education: Option<String>,
    pub employment: Option<String>,
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedJob {
    pub job_id: i64,
}

/// POST /jobs
///
/// Company and tags are resolved insert-or-get by name; the job row, its
/// company and its tag links commit in one transaction.
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedJob>>), AppError> {
    let (title, company_name, location) = match (&req.title, &req.company, &req.location) {
        (Some(t), Some(c), Some(l)) if !t.is_empty() && !c.is_empty() && !l.is_empty() => {
            (t.clone(), c.clone(), l.clone())
        }
        _ => return Err(AppError::Validation("Missing required fields".to_string())),
    };

    let (region, district) = normalize::split_location(&location);
    let location_id = state
        .lookup
        .location_id(&region, &district)
        .await
        .ok_or_else(|| AppError::Validation(format!("Invalid location: {location}")))?;

    let deadline = parse_deadline_field(req.deadline.as_deref())?;

    let mut tx = state.db.begin().await?;

    let company_id = upsert::company_id(
        &mut tx,
        &company_name,
        location_id,
        req.company_link.as_deref(),
    )
    .await?;

    let job_id: i64 = sqlx::query_scalar(
        "INSERT INTO jobs (title, company_id, location_id, salary, career, education, employment, deadline, link)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id",
    )
    .bind(&title)
    .bind(company_id)
    .bind(location_id)
    .bind(&req.salary)
    .bind(&req.career)
    .bind(&req.education)
    .bind(&req.employment)
    .bind(deadline)
    .bind(&req.link)
    .fetch_one(&mut *tx)
    .await?;

    let new_tags = attach_tags(&mut tx, &state, job_id, &req.tags).await?;

    tx.commit().await?;

    // Cache updates only after the rows are committed.
    for (name, id) in new_tags {
        state.lookup.insert_tag(&name, id).await;
    }

    tracing::info!(job_id, "Job created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(CreatedJob { job_id }).with_message("Job created successfully")),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_link: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub career: Option<String>,
    pub education: Option<String>,
    pub employment: Option<String>,
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: Option<String>,
}

impl UpdateJobRequest {
    /// Empty strings count as absent fields, not values to store.
    fn normalize(self) -> Self {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|v| !v.trim().is_empty())
        }
        Self {
            title: present(self.title),
            company: present(self.company),
            company_link: present(self.company_link),
            location: present(self.location),
            salary: present(self.salary),
            career: present(self.career),
            education: present(self.education),
            employment: present(self.employment),
            deadline: present(self.deadline),
            tags: self
                .tags
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            link: present(self.link),
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.salary.is_none()
            && self.career.is_none()
            && self.education.is_none()
            && self.employment.is_none()
            && self.deadline.is_none()
            && self.link.is_none()
            && self.tags.is_empty()
    }
}

/// PUT /jobs/{id}
///
/// Field-by-field dynamic update; a non-empty tag list replaces the job's
/// tags wholesale.
pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let req = req.normalize();
    if req.is_empty() {
        return Err(AppError::Validation(
            "No fields provided for update".to_string(),
        ));
    }

    let current_location: Option<i64> =
        sqlx::query_scalar("SELECT location_id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&state.db)
            .await?;
    let current_location =
        current_location.ok_or_else(|| AppError::NotFound("Job not found.".to_string()))?;

    let new_location_id = match &req.location {
        Some(location) => {
            let (region, district) = normalize::split_location(location);
            Some(
                state
                    .lookup
                    .location_id(&region, &district)
                    .await
                    .ok_or_else(|| AppError::Validation(format!("Invalid location: {location}")))?,
            )
        }
        None => None,
    };

    let deadline = parse_deadline_field(req.deadline.as_deref())?;

    let mut tx = state.db.begin().await?;

    let company_id = match &req.company {
        Some(name) => Some(
            upsert::company_id(
                &mut tx,
                name,
                new_location_id.unwrap_or(current_location),
                req.company_link.as_deref(),
            )
            .await?,
        ),
        None => None,
    };

    let mut qb = QueryBuilder::new("UPDATE jobs SET ");
    let mut fields = qb.separated(", ");
    if let Some(title) = &req.title {
        fields.push("title = ");
        fields.push_bind_unseparated(title.clone());
    }
    if let Some(location_id) = new_location_id {
        fields.push("location_id = ");
        fields.push_bind_unseparated(location_id);
    }
    if let Some(company_id) = company_id {
        fields.push("company_id = ");
        fields.push_bind_unseparated(company_id);
    }
    if let Some(salary) = &req.salary {
        fields.push("salary = ");
        fields.push_bind_unseparated(salary.clone());
    }
    if let Some(career) = &req.career {
        fields.push("career = ");
        fields.push_bind_unseparated(career.clone());
    }
    if let Some(education) = &req.education {
        fields.push("education = ");
        fields.push_bind_unseparated(education.clone());
    }
    if let Some(employment) = &req.employment {
        fields.push("employment = ");
        fields.push_bind_unseparated(employment.clone());
    }
    if let Some(deadline) = deadline {
        fields.push("deadline = ");
        fields.push_bind_unseparated(deadline);
    }
    if let Some(link) = &req.link {
        fields.push("link = ");
        fields.push_bind_unseparated(link.clone());
    }
    // The empty-request case was rejected above, but tags alone is valid:
    // touching nothing else still needs a well-formed statement.
    fields.push("id = id");
    qb.push(" WHERE id = ").push_bind(job_id);
    qb.build().execute(&mut *tx).await?;

    let new_tags = if req.tags.is_empty() {
        Vec::new()
    } else {
        sqlx::query("DELETE FROM job_tags WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        attach_tags(&mut tx, &state, job_id, &req.tags).await?
    };

    tx.commit().await?;

    for (name, id) in new_tags {
        state.lookup.insert_tag(&name, id).await;
    }

    Ok(Json(ApiResponse::message("Job updated successfully")))
}

/// DELETE /jobs/{id}
///
/// Cascades across favorites, applications and tag links before removing the
/// job, all in one transaction.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut tx = state.db.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Job not found.".to_string()));
    }

    for table in ["favorites", "applications", "job_tags"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE job_id = $1"))
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(job_id, "Job deleted");

    Ok(Json(ApiResponse::message("Job deleted successfully.")))
}

/// GET /jobs/{id}
///
/// Reading a job bumps its view counter as a side effect. The bump is a
/// single atomic `UPDATE ... RETURNING`, so concurrent reads each count.
pub async fn get_job_detail(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<ApiResponse<JobDetail>>, AppError> {
    let views: Option<i64> =
        sqlx::query_scalar("UPDATE jobs SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(job_id)
            .fetch_optional(&state.db)
            .await?;
    let views = views.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let row: JobDetailRow = sqlx::query_as(
        "SELECT j.id, j.title, j.salary, j.career, j.education, j.employment, j.deadline, j.link, j.views,
                c.name AS company_name, c.link AS company_link,
                l.region, l.district
         FROM jobs j
         JOIN companies c ON j.company_id = c.id
         JOIN locations l ON j.location_id = l.id
         WHERE j.id = $1",
    )
    .bind(job_id)
    .fetch_one(&state.db)
    .await?;

    let tags: Vec<String> = sqlx::query_scalar(
        "SELECT t.name
         FROM job_tags jt
         JOIN tags t ON jt.tag_id = t.id
         WHERE jt.job_id = $1
         ORDER BY t.name",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::data(JobDetail::from_row(row, views, tags))))
}

/// Resolves each tag name to an id (insert-or-get) and links it to the job.
/// Returns the names that were not in the lookup cache so the caller can
/// record them after commit.
async fn attach_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    state: &AppState,
    job_id: i64,
    tags: &[String],
) -> Result<Vec<(String, i64)>, AppError> {
    let mut new_tags = Vec::new();
    for name in tags {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let tag_id = match state.lookup.tag_id(name).await {
            Some(id) => id,
            None => {
                let id = upsert::tag_id(tx, name).await?;
                new_tags.push((name.to_string(), id));
                id
            }
        };
        upsert::attach_job_tag(tx, job_id, tag_id).await?;
    }
    Ok(new_tags)
}

fn parse_deadline_field(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => normalize::parse_deadline(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid deadline: {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_empty_strings_count_as_absent() {
        let req: UpdateJobRequest =
            serde_json::from_str(r#"{"title": "", "salary": "", "tags": ["", "  "]}"#).unwrap();
        let req = req.normalize();
        assert!(req.is_empty());
    }

    #[test]
    fn test_update_request_normalize_keeps_real_values() {
        let req: UpdateJobRequest =
            serde_json::from_str(r#"{"title": "백엔드 엔지니어", "salary": "", "tags": ["Python", ""]}"#)
                .unwrap();
        let req = req.normalize();
        assert_eq!(req.title.as_deref(), Some("백엔드 엔지니어"));
        assert_eq!(req.salary, None);
        assert_eq!(req.tags, vec!["Python".to_string()]);
        assert!(!req.is_empty());
    }

    #[test]
    fn test_parse_deadline_field_rejects_garbage() {
        assert!(parse_deadline_field(Some("nonsense")).is_err());
        assert_eq!(parse_deadline_field(Some("")).unwrap(), None);
        assert_eq!(parse_deadline_field(None).unwrap(), None);
    }
}
