//! Application configuration.
//!
//! Values come from environment variables (a `.env` file is loaded first in
//! `main`), falling back to development defaults where that is safe.

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// HTTP listen port
    pub port: u16,

    /// Secret used to sign the session cookie
    pub jwt_secret: String,

    /// Lifetime of a vendor session in hours
    pub session_hours: i64,

    /// Credential for the generative model; AI screens degrade without it
    pub gemini_api_key: Option<String>,

    pub gemini_model: String,

    pub gemini_endpoint: String,

    /// Printed at the top of receipts and pages
    pub store_display_name: String,

    pub store_tagline: String,

    /// Maximum request body size (bill photos are uploaded inline)
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingRequired("DATABASE_URL".to_string()))?;

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(AppConfig {
            database_url,

            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "medistore-dev-secret-change-in-production".to_string()),

            session_hours: env::var("SESSION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SESSION_HOURS".to_string()))?,

            gemini_api_key,

            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),

            gemini_endpoint: env::var("GEMINI_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),

            store_display_name: env::var("STORE_DISPLAY_NAME")
                .unwrap_or_else(|_| "New Kallu Medical Store".to_string()),

            store_tagline: env::var("STORE_TAGLINE").unwrap_or_else(|_| "by Rinku".to_string()),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string()) // 10MB
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()))?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
