use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use http::Method;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ApiClientConfig, validate_base_url};
use crate::credential::{Credential, GrantType, TokenParams};
use crate::error::{ClientError, CredentialError};

/// OAuth2 provider capability consumed by the pipeline.
///
/// The provider owns the HTTP transport and knows how to exchange grants for
/// bearer credentials. The pipeline never talks to the token endpoint itself.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Base URL every endpoint path is appended to.
    fn base_url(&self) -> &str;

    /// Transport used for API calls.
    fn http_client(&self) -> &reqwest::Client;

    /// Exchange a grant for a new credential.
    ///
    /// # Errors
    /// Returns [`CredentialError`] if the token endpoint is unreachable,
    /// rejects the grant, or answers with something that is not a token.
    async fn get_access_token(
        &self,
        grant: GrantType,
        params: TokenParams,
    ) -> Result<Credential, CredentialError>;

    /// Start a request that carries `credential` as a bearer token.
    fn get_authenticated_request(
        &self,
        method: Method,
        url: &str,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        self.http_client()
            .request(method, url)
            .bearer_auth(credential.access_token())
    }
}

/// Provider for a standard OAuth2 token endpoint using client authentication
/// in the form body.
pub struct GenericProvider {
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GenericProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericProvider")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct TokenForm<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl GenericProvider {
    /// Create a provider.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `base_url` is malformed, `timeout`
    /// is zero, or the transport cannot be built.
    pub fn new(
        base_url: &str,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = validate_base_url(base_url)?;
        if timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".into()));
        }
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            http_client,
        })
    }

    /// Create a provider from client configuration.
    ///
    /// # Errors
    /// Same as [`GenericProvider::new`].
    pub fn from_config(config: &ApiClientConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            config.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.timeout(),
        )
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait::async_trait]
impl Provider for GenericProvider {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    async fn get_access_token(
        &self,
        grant: GrantType,
        params: TokenParams,
    ) -> Result<Credential, CredentialError> {
        let scope = params.scope_string();
        let form = TokenForm {
            grant_type: grant.as_str(),
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            refresh_token: params
                .refresh_token
                .as_ref()
                .map(ExposeSecret::expose_secret),
            scope: (!scope.is_empty()).then_some(scope),
        };
        let body = serde_urlencoded::to_string(&form)
            .map_err(|e| CredentialError::Encoding(e.to_string()))?;

        debug!(grant = %grant, token_url = %self.token_url, "requesting access token");

        let resp = self
            .http_client
            .post(&self.token_url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|e| {
                debug!(error = %e, "failed to read token rejection body");
                String::new()
            });
            return Err(CredentialError::Rejected { status, body });
        }

        let bytes = resp.bytes().await?;
        let token: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        Ok(credential_from_response(token, params))
    }
}

fn credential_from_response(token: TokenResponse, params: TokenParams) -> Credential {
    let scopes: BTreeSet<String> = match token.scope {
        Some(scope) => scope.split_whitespace().map(str::to_owned).collect(),
        None => params.scopes,
    };
    let refresh_token = token.refresh_token.or_else(|| {
        params
            .refresh_token
            .as_ref()
            .map(|t| t.expose_secret().to_owned())
    });

    let mut credential = Credential::new(token.access_token).with_scopes(scopes);
    if let Some(refresh_token) = refresh_token {
        credential = credential.with_refresh_token(refresh_token);
    }
    let expires_at = token
        .expires_in
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl));
    if let Some(expires_at) = expires_at {
        credential = credential.with_expires_at(expires_at);
    }
    credential
}
