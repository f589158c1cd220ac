use std::env;
use std::time::Duration;

use crate::error::ApiConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "ASCENT_API_URL";
pub const ENV_TOKEN: &str = "ASCENT_API_TOKEN";
pub const ENV_REQUEST_TIMEOUT: &str = "ASCENT_REQUEST_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `ASCENT_API_URL`, `ASCENT_API_TOKEN` and
    /// `ASCENT_REQUEST_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ApiConfigError` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ApiConfigError> {
        let base_url = match lookup(ENV_BASE_URL) {
            Some(url) if url.trim().is_empty() => return Err(ApiConfigError::EmptyBaseUrl),
            Some(url) => url.trim().to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };

        let request_timeout = match lookup(ENV_REQUEST_TIMEOUT) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ApiConfigError::InvalidTimeout { raw: raw.clone() })?;
                if secs == 0 {
                    return Err(ApiConfigError::InvalidTimeout { raw });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self::new(base_url)
            .with_token(lookup(ENV_TOKEN))
            .with_request_timeout(request_timeout))
    }

    /// Join `path` onto the base URL without doubling slashes.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.token, None);
    }

    #[test]
    fn reads_all_values() {
        let config = ApiConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://api.example.test/"),
            (ENV_TOKEN, "abc"),
            (ENV_REQUEST_TIMEOUT, "5"),
        ]))
        .unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoint("/api/assessment/generate/"),
            "https://api.example.test/api/assessment/generate/"
        );
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = ApiConfig::from_lookup(lookup(&[(ENV_TOKEN, "  ")])).unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[(ENV_BASE_URL, " ")])),
            Err(ApiConfigError::EmptyBaseUrl)
        );
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT, "soon")])),
            Err(ApiConfigError::InvalidTimeout { raw: "soon".into() })
        );
        assert!(ApiConfig::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT, "0")])).is_err());
    }
}
