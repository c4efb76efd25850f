use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use crate::auth::{password, tokens, AuthUser};
use crate::errors::AppError;
use crate::models::user::{UserCredentials, UserRecord};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub user: UserRecord,
    pub refresh_token: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>), AppError> {
    let (email, password, name) = match (req.email, req.password, req.name) {
        (Some(e), Some(p), Some(n)) if !e.is_empty() && !p.is_empty() && !n.is_empty() => (e, p, n),
        _ => {
            return Err(AppError::Validation(
                "Missing required fields.".to_string(),
            ))
        }
    };

    let hash = password::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;

    let mut tx = state.db.begin().await?;

    let user: UserRecord = sqlx::query_as(
        "INSERT INTO users (email, password, name) VALUES ($1, $2, $3)
         RETURNING id, email, name, created_at, updated_at",
    )
    .bind(&email)
    .bind(&hash)
    .bind(&name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Email already exists."))?;

    let refresh_token = tokens::issue_refresh_token(
        user.id,
        &state.config.jwt_refresh_secret,
        state.config.refresh_token_ttl_days,
    )?;
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token) VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET token = EXCLUDED.token",
    )
    .bind(user.id)
    .bind(&refresh_token)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(RegisterResponse {
                user,
                refresh_token,
            })
            .with_message("User registered successfully."),
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /auth/login
///
/// Verifies credentials, appends a login-history row and rotates the stored
/// refresh token, invalidating the previous one.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(AppError::Validation(
                "Missing required fields.".to_string(),
            ))
        }
    };

    let user: Option<UserCredentials> =
        sqlx::query_as("SELECT id, password FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&state.db)
            .await?;

    let user = match user {
        Some(u) if password::verify_password(&password, &u.password) => u,
        _ => return Err(AppError::Unauthorized("Invalid credentials.".to_string())),
    };

    let access_token = tokens::issue_access_token(
        user.id,
        &state.config.jwt_access_secret,
        state.config.access_token_ttl_minutes,
    )?;
    let refresh_token = tokens::issue_refresh_token(
        user.id,
        &state.config.jwt_refresh_secret,
        state.config.refresh_token_ttl_days,
    )?;

    let mut tx = state.db.begin().await?;
    sqlx::query("INSERT INTO login_history (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token) VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET token = EXCLUDED.token",
    )
    .bind(user.id)
    .bind(&refresh_token)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Json(
        ApiResponse::data(TokenPair {
            access_token,
            refresh_token,
        })
        .with_message("Login successful."),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

/// POST /auth/refresh
///
/// Exchanges a stored, unexpired refresh token for a new access token. The
/// token must both decode under the refresh secret and still be the one on
/// file for the decoded user.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AccessToken>>, AppError> {
    let refresh_token = req
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Refresh token is required".to_string()))?;

    let claims = tokens::decode_token(&refresh_token, &state.config.jwt_refresh_secret)?;

    let stored: Option<i64> =
        sqlx::query_scalar("SELECT user_id FROM refresh_tokens WHERE token = $1 AND user_id = $2")
            .bind(&refresh_token)
            .bind(claims.user_id)
            .fetch_optional(&state.db)
            .await?;
    if stored.is_none() {
        return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
    }

    let access_token = tokens::issue_access_token(
        claims.user_id,
        &state.config.jwt_access_secret,
        state.config.access_token_ttl_minutes,
    )?;

    Ok(Json(ApiResponse::data(AccessToken { access_token })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub password: Option<String>,
    pub name: Option<String>,
}

/// PUT /auth/profile
///
/// An empty string counts as an absent field, not a value to store.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let password = req.password.filter(|p| !p.is_empty());
    let name = req.name.filter(|n| !n.is_empty());
    if password.is_none() && name.is_none() {
        return Err(AppError::Validation(
            "No fields provided for update".to_string(),
        ));
    }

    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut fields = qb.separated(", ");
    if let Some(password) = &password {
        let hash = password::hash_password(password)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;
        fields.push("password = ");
        fields.push_bind_unseparated(hash);
    }
    if let Some(name) = name {
        fields.push("name = ");
        fields.push_bind_unseparated(name);
    }
    fields.push("updated_at = NOW()");
    qb.push(" WHERE id = ").push_bind(auth.user_id);

    qb.build().execute(&state.db).await?;

    Ok(Json(ApiResponse::message(
        "User information has been successfully updated.",
    )))
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: UserRecord,
    pub last_login: Option<DateTime<Utc>>,
}

/// GET /auth/info
pub async fn get_info(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let user: Option<UserRecord> = sqlx::query_as(
        "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let last_login: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT login_time FROM login_history WHERE user_id = $1 ORDER BY login_time DESC LIMIT 1",
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(ApiResponse::data(UserInfo { user, last_login })))
}

/// DELETE /auth/delete
///
/// Removes the account and everything it owns in a single transaction, so a
/// mid-sequence failure cannot leave a half-deleted user.
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut tx = state.db.begin().await?;

    // Applications reference resumes, so they go first.
    for table in [
        "applications",
        "resumes",
        "favorites",
        "refresh_tokens",
        "login_history",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
            .bind(auth.user_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = auth.user_id, "Account deleted");

    Ok(Json(ApiResponse::message(
        "Account has been successfully deleted.",
    )))
}
