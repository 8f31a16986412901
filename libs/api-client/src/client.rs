use std::collections::BTreeSet;
use std::sync::Arc;

use http::header::{AUTHORIZATION, HeaderValue};
use http::{HeaderMap, Method};
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::config::{ApiClientConfig, validate_base_url};
use crate::credential::Credential;
use crate::error::{ClientError, RequestSnapshot, ResponseSnapshot};
use crate::provider::{GenericProvider, Provider};
use crate::request::{Payload, build_request};
use crate::response::Response;
use crate::token::TokenManager;
use crate::translate::translate;

/// Shared request pipeline used by every endpoint wrapper.
///
/// One call runs credential check, request building, dispatch and, on a
/// 4xx/5xx answer, error translation. Nothing is retried.
pub struct ApiClient {
    provider: Arc<dyn Provider>,
    base_url: String,
    tokens: TokenManager,
    language: Option<HeaderValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a pipeline on top of `provider`.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the provider's base URL is malformed.
    pub fn new(provider: Arc<dyn Provider>) -> Result<Self, ClientError> {
        let base_url = validate_base_url(provider.base_url())?;
        Ok(Self {
            provider,
            base_url,
            tokens: TokenManager::default(),
            language: None,
        })
    }

    /// Create client from configuration, backed by a [`GenericProvider`]
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the base URL or language is invalid.
    pub fn from_config(config: ApiClientConfig) -> Result<Self, ClientError> {
        let provider = GenericProvider::from_config(&config)?;
        let mut client = Self::new(Arc::new(provider))?;
        client.set_scopes(config.scopes);
        if let Some(refresh_token) = config.refresh_token {
            client.tokens.set_refresh_token(refresh_token);
        }
        if let Some(language) = config.language {
            client.set_language(&language)?;
        }
        Ok(client)
    }

    /// Use `refresh_token` for future exchanges. Drops the held access
    /// credential so the next call exchanges again.
    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.tokens
            .set_refresh_token(SecretString::from(refresh_token.into()));
    }

    pub fn set_access_token(&mut self, credential: Credential) {
        self.tokens.set_credential(credential);
    }

    pub fn set_scopes<I, S>(&mut self, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens
            .set_scopes(scopes.into_iter().map(Into::into).collect::<BTreeSet<_>>());
    }

    /// Send `language` as `Accept-Language` on every request.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `language` is not a valid header value.
    pub fn set_language(&mut self, language: &str) -> Result<(), ClientError> {
        let value = HeaderValue::from_str(language)
            .map_err(|e| ClientError::Config(format!("invalid language {language:?}: {e}")))?;
        self.language = Some(value);
        Ok(())
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Base URL with trailing slashes removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current credential, refreshed first if absent or expired.
    ///
    /// # Errors
    /// Returns [`ClientError::Credential`] if the exchange fails.
    pub async fn get_access_token(&self) -> Result<Credential, ClientError> {
        Ok(self
            .tokens
            .ensure_valid_credential(self.provider.as_ref())
            .await?)
    }

    /// Run one API call through the pipeline.
    ///
    /// `url` is the full URL, usually produced by the [`query`](crate::query)
    /// builders.
    ///
    /// # Errors
    /// - [`ClientError::Api`] for any 4xx/5xx answer, translated by status.
    /// - [`ClientError::Credential`] if the token exchange fails.
    /// - [`ClientError::Transport`] for network failures and timeouts.
    /// - [`ClientError::Io`] if an upload file exists but cannot be read.
    pub async fn call_api(
        &self,
        method: Method,
        url: &str,
        payload: Option<Payload>,
    ) -> Result<Response, ClientError> {
        let credential = self.get_access_token().await?;
        let request = build_request(
            self.provider.as_ref(),
            &credential,
            self.language.as_ref(),
            method,
            url,
            payload,
        )
        .await?;
        self.send(request).await
    }

    /// Dispatch a built request and translate failed statuses.
    async fn send(&self, request: reqwest::Request) -> Result<Response, ClientError> {
        let snapshot = RequestSnapshot {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: redacted(request.headers()),
        };
        debug!(method = %snapshot.method, url = %snapshot.url, "dispatching request");

        let resp = self.provider.http_client().execute(request).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        if status.is_client_error() || status.is_server_error() {
            let err = translate(
                snapshot,
                ResponseSnapshot {
                    status,
                    headers,
                    body,
                },
            );
            warn!(status = status.as_u16(), kind = err.kind().name(), "API request failed");
            return Err(err.into());
        }

        Ok(Response::new(status, headers, body))
    }

    /// Blocking version of [`ApiClient::call_api`] for sync contexts.
    ///
    /// Runs the call on a private current-thread runtime.
    ///
    /// # Errors
    /// Same as [`ApiClient::call_api`], plus [`ClientError::Runtime`] when
    /// called from inside a Tokio runtime.
    pub fn call_api_blocking(
        &self,
        method: Method,
        url: &str,
        payload: Option<Payload>,
    ) -> Result<Response, ClientError> {
        block_on(self.call_api(method, url, payload))
    }

    /// Blocking version of [`ApiClient::get_access_token`].
    ///
    /// # Errors
    /// Same as [`ApiClient::get_access_token`], plus [`ClientError::Runtime`]
    /// when called from inside a Tokio runtime.
    pub fn get_access_token_blocking(&self) -> Result<Credential, ClientError> {
        block_on(self.get_access_token())
    }
}

fn block_on<F, T>(future: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ClientError::Runtime(
            "blocking call made from inside an async runtime; use the async API".into(),
        ));
    }
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

fn redacted(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static("[REDACTED]"));
    }
    headers
}
