use std::fmt::Display;
use std::str::FromStr;

use sourcelab_core::document::MAX_UPLOAD_BYTES;

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Editor origins allowed by CORS.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Largest accepted image upload in bytes.
    pub max_upload_bytes: usize,
    /// SQLite connection string. The in-memory default loses data on exit.
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

impl ServerConfig {
    /// Start from [`Default`] and apply `HOST`, `PORT`, `CORS_ORIGINS`
    /// (comma-separated), `REQUEST_TIMEOUT_SECS`, `MAX_UPLOAD_BYTES` and
    /// `DATABASE_URL` when set.
    ///
    /// Panics on a value that does not parse, so a bad deployment fails at
    /// startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: env_or("PORT", defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            database_url: env_or("DATABASE_URL", defaults.database_url),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
