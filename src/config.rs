// Client configuration, loaded from the environment

use std::time::Duration;

use crate::api_client::ClientError;

pub const DEFAULT_REFRESH_ENDPOINT: &str = "/api/auth/refresh-session";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    // Prefix for every `request()` endpoint
    pub base_url: String,
    // Upstream service reached by the backend proxy
    pub backend_url: String,
    pub refresh_endpoint: String,
    pub login_path: String,
    pub redirect_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            redirect_delay_ms: 1500,
            timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            base_url: lookup("API_BASE_URL").unwrap_or(defaults.base_url),
            backend_url: lookup("BACKEND_URL").unwrap_or(defaults.backend_url),
            refresh_endpoint: lookup("AUTH_REFRESH_ENDPOINT").unwrap_or(defaults.refresh_endpoint),
            login_path: lookup("LOGIN_PATH").unwrap_or(defaults.login_path),
            redirect_delay_ms: parse_ms(&lookup, "SESSION_REDIRECT_DELAY_MS")?
                .unwrap_or(defaults.redirect_delay_ms),
            timeout_ms: parse_ms(&lookup, "REQUEST_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        for (name, url) in [("base_url", &self.base_url), ("backend_url", &self.backend_url)] {
            reqwest::Url::parse(url)
                .map_err(|e| ClientError::ConfigError(format!("{name} {url:?}: {e}")))?;
        }

        for (name, path) in [
            ("refresh_endpoint", &self.refresh_endpoint),
            ("login_path", &self.login_path),
        ] {
            if !path.starts_with('/') {
                return Err(ClientError::ConfigError(format!(
                    "{name} must start with '/', got {path:?}"
                )));
            }
        }

        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    // Trailing slash on the base is dropped so `base + "/x"` never doubles up
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

fn parse_ms<F>(lookup: &F, key: &str) -> Result<Option<u64>, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|e| ClientError::ConfigError(format!("{key} must be a number: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.refresh_endpoint, "/api/auth/refresh-session");
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.redirect_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://app.example.com/"),
            ("SESSION_REDIRECT_DELAY_MS", " 250 "),
            ("REQUEST_TIMEOUT_MS", "5000"),
        ]))
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.redirect_delay_ms, 250);
        assert_eq!(
            config.endpoint_url("/api/bookings"),
            "https://app.example.com/api/bookings"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_number = ClientConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_MS", "soon")]));
        assert!(matches!(bad_number, Err(ClientError::ConfigError(_))));

        let bad_url = ClientConfig::from_lookup(lookup_from(&[("BACKEND_URL", "not a url")]));
        assert!(matches!(bad_url, Err(ClientError::ConfigError(_))));

        let bad_path = ClientConfig::from_lookup(lookup_from(&[("LOGIN_PATH", "auth/login")]));
        assert!(matches!(bad_path, Err(ClientError::ConfigError(_))));

        let zero_timeout = ClientConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_MS", "0")]));
        assert!(matches!(zero_timeout, Err(ClientError::ConfigError(_))));
    }
}
