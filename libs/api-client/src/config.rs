use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::ClientError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// scheme://host[:port][/path]
static BASE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]{1,5})?(?:/[A-Za-z0-9._~%!$&'()*+,;=:@/-]*)?$",
    )
    .unwrap_or_else(|e| unreachable!("base URL pattern is valid: {e}"))
});

/// Check `base_url` against the accepted shape and strip trailing slashes.
///
/// # Errors
/// Returns [`ClientError::Config`] if the URL does not match
/// `scheme://host[:port][/path]` with an `http` or `https` scheme.
pub fn validate_base_url(base_url: &str) -> Result<String, ClientError> {
    if !BASE_URL_PATTERN.is_match(base_url) {
        return Err(ClientError::Config(format!("invalid base URL: {base_url}")));
    }
    Ok(base_url.trim_end_matches('/').to_owned())
}

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub language: Option<String>,
    /// Human-readable duration such as `"30s"` or `"500ms"`.
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl ApiClientConfig {
    /// Client-credentials configuration with no scopes and the default timeout.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scopes: Vec::new(),
            refresh_token: None,
            language: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create configuration from environment variables
    ///
    /// Expects:
    /// - `API_CLIENT_BASE_URL`: base URL of the REST API (required)
    /// - `API_CLIENT_TOKEN_URL`: OAuth2 token endpoint (required)
    /// - `API_CLIENT_ID` / `API_CLIENT_SECRET`: client credentials (required)
    /// - `API_CLIENT_SCOPES`: space or comma separated scopes
    /// - `API_CLIENT_REFRESH_TOKEN`: refresh token to exchange instead of
    ///   client credentials
    /// - `API_CLIENT_LANGUAGE`: value for `Accept-Language`
    /// - `API_CLIENT_TIMEOUT`: request timeout such as `30s` or `500ms`
    ///   (default: 30s)
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if a required variable is missing or
    /// the timeout is not a valid duration.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::new(
            required_var("API_CLIENT_BASE_URL")?,
            required_var("API_CLIENT_TOKEN_URL")?,
            required_var("API_CLIENT_ID")?,
            required_var("API_CLIENT_SECRET")?,
        );

        if let Some(scopes) = optional_var("API_CLIENT_SCOPES") {
            config.scopes = scopes
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
        }
        config.refresh_token = optional_var("API_CLIENT_REFRESH_TOKEN").map(SecretString::from);
        config.language = optional_var("API_CLIENT_LANGUAGE");
        if let Some(timeout) = optional_var("API_CLIENT_TIMEOUT") {
            config.timeout = humantime::parse_duration(&timeout).map_err(|e| {
                ClientError::Config(format!("invalid API_CLIENT_TIMEOUT {timeout:?}: {e}"))
            })?;
        }

        Ok(config)
    }
}

fn required_var(name: &str) -> Result<String, ClientError> {
    optional_var(name).ok_or_else(|| ClientError::Config(format!("{name} not set")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_accepts_valid_base_urls() {
        for url in [
            "https://api.example.com",
            "https://api.example.com/v2",
            "http://localhost:8080",
            "http://127.0.0.1:41235/api/v1/",
            "https://api-eu.example.co.uk:443/rest/v3",
        ] {
            assert!(validate_base_url(url).is_ok(), "{url} should be accepted");
        }
    }

    #[test]
    fn test_rejects_invalid_base_urls() {
        for url in [
            "",
            "api.example.com",
            "ftp://api.example.com",
            "https://",
            "https://api.example.com:port",
            "https://api.example.com/v2?x=1",
            "https://-bad.example.com",
            "https://api example.com",
        ] {
            assert!(
                matches!(validate_base_url(url), Err(ClientError::Config(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(
            validate_base_url("https://api.example.com/v2/").unwrap(),
            "https://api.example.com/v2"
        );
    }

    #[test]
    fn test_builder() {
        let config = ApiClientConfig::new(
            "https://api.example.com",
            "https://auth.example.com/token",
            "client",
            "secret",
        )
        .with_scopes(["read", "write"])
        .with_language("de")
        .with_timeout(Duration::from_secs(60));

        assert_eq!(config.scopes, vec!["read", "write"]);
        assert_eq!(config.language.as_deref(), Some("de"));
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.client_secret.expose_secret(), "secret");
        assert!(config.refresh_token.is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ApiClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://api.example.com",
            "token_url": "https://auth.example.com/token",
            "client_id": "client",
            "client_secret": "secret"
        }))
        .unwrap();

        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.scopes.is_empty());
        assert!(config.language.is_none());
    }

    #[test]
    fn test_sub_second_timeout_kept() {
        let config = ApiClientConfig::new(
            "https://api.example.com",
            "https://auth.example.com/token",
            "client",
            "secret",
        )
        .with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_deserialize_timeout() {
        let config: ApiClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://api.example.com",
            "token_url": "https://auth.example.com/token",
            "client_id": "client",
            "client_secret": "secret",
            "timeout": "750ms"
        }))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(750));

        let err = serde_json::from_value::<ApiClientConfig>(serde_json::json!({
            "base_url": "https://api.example.com",
            "token_url": "https://auth.example.com/token",
            "client_id": "client",
            "client_secret": "secret",
            "timeout": "soon"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        temp_env::with_vars(
            [
                ("API_CLIENT_BASE_URL", Some("https://api.example.com")),
                ("API_CLIENT_TOKEN_URL", Some("https://auth.example.com/token")),
                ("API_CLIENT_ID", Some("client")),
                ("API_CLIENT_SECRET", Some("secret")),
                ("API_CLIENT_TIMEOUT", Some("5")),
            ],
            || {
                let err = ApiClientConfig::from_env().unwrap_err();
                assert!(matches!(err, ClientError::Config(_)));
            },
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("API_CLIENT_BASE_URL", Some("https://api.example.com")),
                ("API_CLIENT_TOKEN_URL", Some("https://auth.example.com/token")),
                ("API_CLIENT_ID", Some("client")),
                ("API_CLIENT_SECRET", Some("secret")),
                ("API_CLIENT_SCOPES", Some("read, write")),
                ("API_CLIENT_REFRESH_TOKEN", None),
                ("API_CLIENT_LANGUAGE", Some("cs")),
                ("API_CLIENT_TIMEOUT", Some("1s 500ms")),
            ],
            || {
                let config = ApiClientConfig::from_env().unwrap();
                assert_eq!(config.scopes, vec!["read", "write"]);
                assert_eq!(config.language.as_deref(), Some("cs"));
                assert_eq!(config.timeout(), Duration::from_millis(1500));
                assert!(config.refresh_token.is_none());
            },
        );
    }

    #[test]
    fn test_from_env_requires_credentials() {
        temp_env::with_vars(
            [
                ("API_CLIENT_BASE_URL", Some("https://api.example.com")),
                ("API_CLIENT_TOKEN_URL", Some("https://auth.example.com/token")),
                ("API_CLIENT_ID", None::<&str>),
                ("API_CLIENT_SECRET", Some("secret")),
            ],
            || {
                let err = ApiClientConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("API_CLIENT_ID"));
            },
        );
    }
}
