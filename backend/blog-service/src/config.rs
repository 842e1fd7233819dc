/// Configuration management for Blog Service
///
/// This module handles loading and managing configuration from environment variables.
/// A `.env` file is honoured in development (loaded in `main`).
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Failed to parse {key}='{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0}")]
    Insecure(String),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session token configuration
    pub auth: AuthConfig,
    /// Media host configuration
    pub media: MediaConfig,
    /// Language-model configuration
    pub ai: AiConfig,
    /// Background reconciliation
    pub reconcile: ReconcileConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Upper bound for any single store call
    pub store_timeout_ms: u64,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub cookie_name: String,
    pub token_ttl_secs: i64,
    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
}

/// Media host (Cloudinary) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub folder: String,
    pub max_upload_bytes: usize,
}

/// Language-model (Gemini) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub request_timeout_ms: u64,
}

/// Reconciliation job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Seconds between passes; 0 disables the job
    pub interval_secs: u64,
    /// Comments younger than this are not repaired
    pub min_age_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("PORT", 3003)?,
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match std::env::var("FRONTEND_DOMAIN") {
                Ok(value) => value,
                Err(_) if production => return Err(ConfigError::Missing("FRONTEND_DOMAIN")),
                Err(_) => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err(ConfigError::Insecure(
                    "FRONTEND_DOMAIN cannot be '*' in production".to_string(),
                ));
            }

            CorsConfig { allowed_origins }
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            store_timeout_ms: parse_env_or_default("STORE_TIMEOUT_MS", 5_000)?,
        };

        let auth = {
            let jwt_secret = required("JWT_SECRET")?;
            if production && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::Insecure(format!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PRODUCTION_SECRET_LEN
                )));
            }

            AuthConfig {
                jwt_secret,
                cookie_name: "token".to_string(),
                token_ttl_secs: 24 * 60 * 60,
                secure_cookie: production,
            }
        };

        let media = MediaConfig {
            cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: std::env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: std::env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
            folder: std::env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| "uploads".to_string()),
            max_upload_bytes: parse_env_or_default("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };

        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            request_timeout_ms: parse_env_or_default("GEMINI_TIMEOUT_MS", 30_000)?,
        };

        let reconcile = ReconcileConfig {
            interval_secs: parse_env_or_default("RECONCILE_INTERVAL_SECS", 300)?,
            min_age_secs: parse_env_or_default("RECONCILE_MIN_AGE_SECS", 60)?,
        };

        Ok(Config {
            app,
            cors,
            database,
            auth,
            media,
            ai,
            reconcile,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_env_or_default<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
