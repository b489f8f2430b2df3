use anyhow::Context;
use tracing_subscriber::EnvFilter;

use recipe_auth::{app, is_development, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, USERS_FILE, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = recipe_auth::config::config();
    tracing::info!("Starting Recipe Auth in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }
    config.validate().context("invalid configuration")?;
    if is_development!() && std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("Using the built-in development JWT secret; set JWT_SECRET for real deployments");
    }

    tracing::info!("User store: {}", config.storage.users_file.display());

    let state = AppState::new(config.clone())?;
    let app = app(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Recipe Auth listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
