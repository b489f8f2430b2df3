// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::utils::require_fields;
use crate::app::AppState;
use crate::auth::password::hash_password_blocking;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::{normalize_email, User, UserProfile};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// POST /auth/register - Register new user account
///
/// Expected Input:
/// ```json
/// { "username": "string", "password": "string", "email": "string (optional)" }
/// ```
///
/// Responds 201 with the stored profile. A taken username is 400.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let Json(payload) = payload?;
    let [username, password] = require_fields([
        ("username", payload.username),
        ("password", payload.password),
    ])?;
    let email = normalize_email(payload.email);

    // Cheap pre-check; the store re-checks under its write lock
    if state.store.find(&username).await?.is_some() {
        tracing::warn!("Registration rejected: '{}' already exists", username);
        return Err(crate::store::StoreError::DuplicateUser(username).into());
    }

    let password_hash = hash_password_blocking(password, state.config.security.bcrypt_cost).await?;
    let user = User::new(username, password_hash, email);
    let profile = user.profile();

    state.store.insert(user).await?;

    tracing::info!("Registered user: {}", profile.username);

    Ok(ApiResponse::created(profile))
}
