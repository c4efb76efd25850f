use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::response::{ApiResponse, PageParams, Pagination};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResume {
    pub resume_id: i64,
}

/// POST /resumes
pub async fn create_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ResumeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedResume>>), AppError> {
    let content = req
        .resume_link
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Resume Link is required".to_string()))?;

    let resume_id: i64 =
        sqlx::query_scalar("INSERT INTO resumes (user_id, content) VALUES ($1, $2) RETURNING id")
            .bind(user.user_id)
            .bind(content)
            .fetch_one(&state.db)
            .await?;

    tracing::info!(user_id = user.user_id, resume_id, "Resume created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(CreatedResume { resume_id })
                .with_message("Resume created successfully"),
        ),
    ))
}

/// GET /resumes
///
/// Only the caller's own resumes, most recently updated first.
pub async fn list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<ResumeRecord>>>, AppError> {
    let resumes: Vec<ResumeRecord> = sqlx::query_as(
        "SELECT id, content, created_at, updated_at
         FROM resumes
         WHERE user_id = $1
         ORDER BY updated_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total = resumes.len();
    Ok(Json(ApiResponse::paginated(
        resumes,
        Pagination::of(&page, total),
    )))
}

/// PUT /resumes/{id}
///
/// Ownership is enforced in the WHERE clause; a miss is indistinguishable
/// from a missing row.
pub async fn update_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<i64>,
    Json(req): Json<ResumeRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let content = req
        .resume_link
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("No fields to update provided".to_string()))?;

    let result = sqlx::query(
        "UPDATE resumes SET content = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3",
    )
    .bind(content)
    .bind(resume_id)
    .bind(user.user_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Resume not found or unauthorized".to_string(),
        ));
    }

    Ok(Json(ApiResponse::message("Resume updated successfully")))
}
