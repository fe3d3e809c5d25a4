use std::time::Duration;

use crate::error::SyncError;

/// Quiet period after the last mutation before a snapshot sync fires.
pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the persistence service, without a trailing slash.
    pub api_url: String,
    pub sync_debounce: Duration,
    /// Per-request timeout for REST calls.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            sync_debounce: DEFAULT_SYNC_DEBOUNCE,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `SOURCELAB_API_URL`    | `http://localhost:3001`    |
    /// | `SYNC_DEBOUNCE_MS`     | `2000`                     |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// A number that does not parse is a [`SyncError::Validation`].
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let defaults = Self::default();

        let api_url = lookup("SOURCELAB_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let sync_debounce = match lookup("SYNC_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(parse_number("SYNC_DEBOUNCE_MS", &raw)?),
            None => defaults.sync_debounce,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url,
            sync_debounce,
            request_timeout,
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, SyncError> {
    raw.trim()
        .parse()
        .map_err(|e| SyncError::Validation(format!("{key} has an invalid value '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, SyncError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.sync_debounce, DEFAULT_SYNC_DEBOUNCE);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("SOURCELAB_API_URL", "https://api.example.test/"),
            ("SYNC_DEBOUNCE_MS", "250"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.test");
        assert_eq!(config.sync_debounce, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_number_is_a_validation_error() {
        let err = load(&[("SYNC_DEBOUNCE_MS", "soon")]).unwrap_err();
        assert_matches!(err, SyncError::Validation(msg) if msg.contains("SYNC_DEBOUNCE_MS"));
    }
}
