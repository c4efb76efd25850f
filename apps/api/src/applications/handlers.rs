use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, STATUS_CANCELED, STATUS_PENDING};
use crate::response::{ApiResponse, PageParams, Pagination};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: Option<i64>,
    pub resume_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedApplication {
    pub application_id: i64,
}

/// POST /applications
///
/// One live application per user and job; a canceled application does not
/// block re-applying. The duplicate check races with concurrent inserts, so
/// the partial unique index backs it up and the insert maps the violation to
/// the same conflict response.
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedApplication>>), AppError> {
    let job_id = req
        .job_id
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;

    let job_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if job_exists.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let duplicate: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM applications WHERE user_id = $1 AND job_id = $2 AND status <> $3",
    )
    .bind(user.user_id)
    .bind(job_id)
    .bind(STATUS_CANCELED)
    .fetch_optional(&state.db)
    .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "You have already applied for this job".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let resume_id = match req.resume_link.as_deref().map(str::trim) {
        Some(content) if !content.is_empty() => {
            Some(resolve_resume(&mut tx, user.user_id, content).await?)
        }
        _ => None,
    };

    let application_id: i64 = sqlx::query_scalar(
        "INSERT INTO applications (user_id, job_id, resume_id, status)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(user.user_id)
    .bind(job_id)
    .bind(resume_id)
    .bind(STATUS_PENDING)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        AppError::conflict_on_unique(e, "You have already applied for this job")
    })?;

    tx.commit().await?;

    tracing::info!(user_id = user.user_id, job_id, application_id, "Application submitted");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(CreatedApplication { application_id })
                .with_message("Application submitted successfully"),
        ),
    ))
}

/// Returns the caller's resume row holding `content`, inserting one if none
/// matches.
async fn resolve_resume(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM resumes WHERE user_id = $1 AND content = $2")
            .bind(user_id)
            .bind(content)
            .fetch_optional(&mut **tx)
            .await?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = sqlx::query_scalar("INSERT INTO resumes (user_id, content) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(content)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub order: Option<String>,
}

/// GET /applications
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<ApplicationRecord>>>, AppError> {
    let direction = match params.order.as_deref().unwrap_or("asc") {
        "asc" => "ASC",
        "desc" => "DESC",
        _ => {
            return Err(AppError::Validation(
                "Invalid order. Use 'asc' or 'desc'.".to_string(),
            ))
        }
    };

    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.user_id, a.job_id, j.title, a.resume_id, a.status, a.applied_at
         FROM applications a
         JOIN jobs j ON a.job_id = j.id
         WHERE a.user_id = ",
    );
    qb.push_bind(user.user_id);
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND a.status = ").push_bind(status.to_string());
    }
    qb.push(format!(" ORDER BY a.applied_at {direction}"));
    qb.push(" LIMIT ").push_bind(page.limit());
    qb.push(" OFFSET ").push_bind(page.offset());

    let applications: Vec<ApplicationRecord> =
        qb.build_query_as().fetch_all(&state.db).await?;

    let total = applications.len();
    Ok(Json(ApiResponse::paginated(
        applications,
        Pagination::of(&page, total),
    )))
}

/// DELETE /applications/{id}
///
/// Cancellation keeps the row for history; only a pending application can
/// transition.
pub async fn cancel_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM applications WHERE id = $1 AND user_id = $2")
            .bind(application_id)
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await?;
    let status =
        status.ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    if status != STATUS_PENDING {
        return Err(AppError::Validation(
            "Only pending applications can be canceled".to_string(),
        ));
    }

    sqlx::query("UPDATE applications SET status = $1 WHERE id = $2")
        .bind(STATUS_CANCELED)
        .bind(application_id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = user.user_id, application_id, "Application canceled");

    Ok(Json(ApiResponse::message(
        "Application status updated to 'canceled'",
    )))
}
