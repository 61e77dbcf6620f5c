use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required and must not be empty")]
    Missing(&'static str),

    #[error("{0} must be a valid port number")]
    InvalidPort(&'static str),
}

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_uri: String,
    pub db_name: String,
    pub db_collection: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "3006".into());
        let port = match port.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => return Err(ConfigError::InvalidPort("PORT")),
        };

        let db_uri = env::var("DB_URI").unwrap_or_default();
        if db_uri.is_empty() {
            return Err(ConfigError::Missing("DB_URI"));
        }

        let db_name = env::var("DB_NAME").unwrap_or_else(|_| "events".into());
        let db_collection = env::var("DB_COLLECTION").unwrap_or_else(|_| "events".into());

        Ok(Self {
            port,
            db_uri,
            db_name,
            db_collection,
        })
    }
}
