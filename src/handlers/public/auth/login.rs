// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::utils::{require_fields, TokenResponse};
use crate::app::AppState;
use crate::auth::password::verify_password_blocking;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Expected Input:
/// ```json
/// { "username": "string", "password": "string" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "token_type": "Bearer",
///     "expires_in": 3600,
///     "user": { "username": "alice", "email": "alice@example.com" }
///   }
/// }
/// ```
///
/// Unknown usernames and wrong passwords both answer 400 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(payload) = payload?;
    let [username, password] = require_fields([
        ("username", payload.username),
        ("password", payload.password),
    ])?;

    // Unknown users still pay for one bcrypt check
    let user = state.store.find(&username).await?;
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.dummy_hash().await?.to_string(),
    };
    let password_matches = verify_password_blocking(password, hash).await?;

    let user = match user {
        Some(user) if password_matches => user,
        Some(_) => {
            tracing::warn!("Failed login attempt for '{}': password mismatch", username);
            return Err(ApiError::bad_request(INVALID_CREDENTIALS));
        }
        None => {
            tracing::warn!("Failed login attempt for unknown user '{}'", username);
            return Err(ApiError::bad_request(INVALID_CREDENTIALS));
        }
    };

    let issued = state.signer.issue(&user)?;

    tracing::info!("Login successful: {}", user.username);

    Ok(ApiResponse::success(TokenResponse::new(issued, user.profile())))
}
