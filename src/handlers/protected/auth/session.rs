use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::public::auth::utils::TokenResponse;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub username: String,
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// GET /api/auth/whoami - Get current authenticated user details
///
/// Re-reads the users file so the email reflects the stored record rather
/// than the token. A user removed after the token was issued is 404.
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<WhoamiResponse> {
    let user = state
        .store
        .find(&auth_user.username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User '{}' not found", auth_user.username)))?;

    Ok(ApiResponse::success(WhoamiResponse {
        username: user.username,
        email: user.email,
        issued_at: auth_user.issued_at,
        expires_at: auth_user.expires_at,
    }))
}

/// PUT /api/auth/session/refresh - Refresh current session token
///
/// Issues a new token with a fresh expiration for the authenticated user.
pub async fn refresh_session(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<TokenResponse> {
    let user = state
        .store
        .find(&auth_user.username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User '{}' not found", auth_user.username)))?;

    let issued = state.signer.issue(&user)?;

    tracing::info!("Session refreshed: {}", user.username);

    Ok(ApiResponse::success(TokenResponse::new(issued, user.profile())))
}
