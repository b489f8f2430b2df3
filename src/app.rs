use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::password::{hash_password_blocking, PasswordError};
use crate::auth::TokenSigner;
use crate::config::{AppConfig, ConfigError, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::store::UserStore;

/// Shared state handed to every handler and to the auth middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<UserStore>,
    pub signer: TokenSigner,
    // Verified against when the username is unknown, so both login failures cost one bcrypt check
    dummy_hash: Arc<OnceCell<String>>,
}

const DUMMY_PASSWORD: &str = "recipe-auth-no-such-user";

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = UserStore::new(config.storage.users_file.clone());
        let signer = TokenSigner::from_config(&config.security)?;

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            signer,
            dummy_hash: Arc::new(OnceCell::new()),
        })
    }

    /// bcrypt hash of a fixed password at the configured cost, computed on first use.
    pub async fn dummy_hash(&self) -> Result<&str, PasswordError> {
        let cost = self.config.security.bcrypt_cost;
        self.dummy_hash
            .get_or_try_init(|| hash_password_blocking(DUMMY_PASSWORD.to_string(), cost))
            .await
            .map(String::as_str)
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(auth_routes(state.clone()))
        .with_state(state);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/session/refresh", put(auth::session_refresh))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Recipe Auth (Rust)",
            "version": version,
            "description": "Flat-file credential check and bearer token issuer",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "register": "POST /auth/register (public)",
                "login": "POST /auth/login (public - token acquisition)",
                "whoami": "GET /api/auth/whoami (protected)",
                "refresh": "PUT /api/auth/session/refresh (protected)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.load().await {
        Ok(users) => {
            tracing::debug!("Health check: {} users on file", users.len());
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": {
                        "status": "ok",
                        "timestamp": now,
                        "store": "ok"
                    }
                })),
            )
        }
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "user store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store": "error"
                    }
                })),
            )
        }
    }
}
