use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// OAuth2 grant used to obtain a bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    RefreshToken,
    ClientCredentials,
}

impl GrantType {
    /// Wire value of the `grant_type` parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters handed to [`Provider::get_access_token`](crate::Provider::get_access_token).
#[derive(Debug, Clone, Default)]
pub struct TokenParams {
    /// Set for [`GrantType::RefreshToken`] exchanges.
    pub refresh_token: Option<SecretString>,
    pub scopes: BTreeSet<String>,
}

impl TokenParams {
    /// Scopes joined with a single space, as sent in the `scope` parameter.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

/// A bearer credential obtained from the token endpoint.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: SecretString,
    expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<SecretString>,
    scopes: BTreeSet<String>,
}

impl Credential {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            expires_at: None,
            refresh_token: None,
            scopes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
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

    /// The bearer token value. Keep it out of logs.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(ExposeSecret::expose_secret)
    }

    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// True once `now` has reached the expiry. A credential without an
    /// expiry never expires. No clock-skew margin is applied.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
