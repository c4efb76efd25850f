use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::auth::tokens;
use crate::errors::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <token>`
/// header. Adding this parameter to a handler gates the route.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = tokens::decode_token(token, &state.config.jwt_access_secret)?;

        Ok(AuthUser {
            user_id: claims.user_id,
        })
    }
}
