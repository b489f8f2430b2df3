use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "recipe-auth-development-secret";

/// One year. Keeps `iat + ttl` well inside chrono's timestamp range.
pub const MAX_JWT_EXPIRY_MINUTES: i64 = 60 * 24 * 365;
/// Cost bounds accepted by `bcrypt::hash`.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_EXPIRY_MINUTES must be between 1 and {max}, got {value}")]
    InvalidJwtExpiry { value: i64, max: i64 },

    #[error("BCRYPT_COST must be between {min} and {max}, got {value}")]
    InvalidBcryptCost { value: u32, min: u32, max: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub users_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("AUTH_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("AUTH_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Storage overrides
        if let Ok(v) = env::var("USERS_FILE") {
            if !v.trim().is_empty() {
                self.storage.users_file = PathBuf::from(v);
            }
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }

        self
    }

    /// Reject settings that would only fail later, per request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.security.token_ttl()?;

        let cost = self.security.bcrypt_cost;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(ConfigError::InvalidBcryptCost {
                value: cost,
                min: MIN_BCRYPT_COST,
                max: MAX_BCRYPT_COST,
            });
        }

        Ok(())
    }

    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                users_file: PathBuf::from("users.json"),
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_minutes: 60,
                bcrypt_cost: 4,
                enable_cors: true,
                cors_origins: Vec::new(), // permissive
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                users_file: PathBuf::from("users.json"),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_minutes: 60,
                bcrypt_cost: 10,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                users_file: PathBuf::from("users.json"),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_minutes: 60,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl SecurityConfig {
    /// Token lifetime, checked against `1..=MAX_JWT_EXPIRY_MINUTES`.
    pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
        let minutes = self.jwt_expiry_minutes;
        let invalid = ConfigError::InvalidJwtExpiry {
            value: minutes,
            max: MAX_JWT_EXPIRY_MINUTES,
        };

        if !(1..=MAX_JWT_EXPIRY_MINUTES).contains(&minutes) {
            return Err(invalid);
        }
        Duration::try_minutes(minutes).ok_or(invalid)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
