//! Commerce configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LAPIDARY_DATABASE_URL` - `SQLite` connection string (falls back to the
//!   generic `DATABASE_URL`)
//!
//! ## Optional
//! - `LAPIDARY_DATA_DIR` - Directory for fallback-cart files and the order
//!   status overlay (default: `./data`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Commerce engine configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// Directory for local persistence (fallback carts, status overlay)
    pub data_dir: PathBuf,
}

impl CommerceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LAPIDARY_DATABASE_URL")?;
        let data_dir = PathBuf::from(get_env_or_default("LAPIDARY_DATA_DIR", "./data"));

        Ok(Self {
            database_url,
            data_dir,
        })
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingEnvVar("LAPIDARY_DATABASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: LAPIDARY_DATABASE_URL"
        );
    }

    #[test]
    fn default_data_dir() {
        assert_eq!(
            get_env_or_default("LAPIDARY_NONEXISTENT_VAR_FOR_TEST", "./data"),
            "./data"
        );
    }
}
