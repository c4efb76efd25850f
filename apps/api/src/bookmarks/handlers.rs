use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::bookmark::BookmarkRecord;
use crate::response::{ApiResponse, PageParams, Pagination};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub job_id: Option<i64>,
}

/// POST /bookmarks
///
/// Toggle semantics: an existing favorite is removed (200), otherwise one is
/// added (201).
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ToggleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), AppError> {
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

    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND job_id = $2")
        .bind(user.user_id)
        .bind(job_id)
        .execute(&state.db)
        .await?;
    if removed.rows_affected() > 0 {
        tracing::info!(user_id = user.user_id, job_id, "Bookmark removed");
        return Ok((StatusCode::OK, Json(ApiResponse::message("Bookmark removed"))));
    }

    sqlx::query("INSERT INTO favorites (user_id, job_id) VALUES ($1, $2)")
        .bind(user.user_id)
        .bind(job_id)
        .execute(&state.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Bookmark already exists"))?;

    tracing::info!(user_id = user.user_id, job_id, "Bookmark added");
    Ok((StatusCode::CREATED, Json(ApiResponse::message("Bookmark added"))))
}

/// GET /bookmarks
///
/// Latest-first by bookmark time.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<BookmarkRecord>>>, AppError> {
    let bookmarks: Vec<BookmarkRecord> = sqlx::query_as(
        "SELECT f.id AS bookmark_id, f.user_id, f.job_id, j.title,
                c.name AS company_name, j.salary, j.deadline
         FROM favorites f
         JOIN jobs j ON f.job_id = j.id
         JOIN companies c ON j.company_id = c.id
         WHERE f.user_id = $1
         ORDER BY f.favorited_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total = bookmarks.len();
    Ok(Json(ApiResponse::paginated(
        bookmarks,
        Pagination::of(&page, total),
    )))
}
