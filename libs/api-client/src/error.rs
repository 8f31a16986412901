use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

/// Errors surfaced by the request pipeline.
///
/// API failures (a 4xx/5xx answer from the remote service) arrive as
/// [`ClientError::Api`]. Transport and credential-exchange failures are
/// propagated as they were raised, without translation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Api(Box<ApiError>),

    #[error("credential exchange failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ClientError {
    /// Returns the translated API error, if this is one.
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Returns the API error kind, if this is a translated API error.
    #[must_use]
    pub fn api_kind(&self) -> Option<&ApiErrorKind> {
        self.as_api().map(ApiError::kind)
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Api(Box::new(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

/// Failure of the OAuth2 token exchange.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("token endpoint rejected the request: status={status}")]
    Rejected { status: StatusCode, body: String },

    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("token request encoding failed: {0}")]
    Encoding(String),
}

/// `limit`/`feature` metadata carried by the 402 family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureLimit {
    pub limit: Option<u64>,
    pub feature: Option<String>,
}

/// Field name to messages, as reported by a 422 response.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Kind of an API failure together with its status-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Auth {
        error_type: Option<String>,
        hint: Option<String>,
    },
    FeatureHardLimit(FeatureLimit),
    FeatureSoftLimit(FeatureLimit),
    FeatureTotalLimit(FeatureLimit),
    FeatureLimit(FeatureLimit),
    NoFeature {
        feature: String,
        plans: Vec<String>,
    },
    NoPermissions,
    NotFound {
        entity_type: Option<String>,
    },
    MethodNotAllowed,
    EntityTooLarge,
    ValidationFailed {
        errors: ValidationErrors,
    },
    RateLimit,
    Server,
}

impl ApiErrorKind {
    /// Stable short name of the kind, used in messages and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ApiErrorKind::BadRequest => "bad request",
            ApiErrorKind::Auth { .. } => "authentication failed",
            ApiErrorKind::FeatureHardLimit(_) => "feature hard limit reached",
            ApiErrorKind::FeatureSoftLimit(_) => "feature soft limit reached",
            ApiErrorKind::FeatureTotalLimit(_) => "feature total limit reached",
            ApiErrorKind::FeatureLimit(_) => "feature limit reached",
            ApiErrorKind::NoFeature { .. } => "feature not available",
            ApiErrorKind::NoPermissions => "no permissions",
            ApiErrorKind::NotFound { .. } => "not found",
            ApiErrorKind::MethodNotAllowed => "method not allowed",
            ApiErrorKind::EntityTooLarge => "entity too large",
            ApiErrorKind::ValidationFailed { .. } => "validation failed",
            ApiErrorKind::RateLimit => "rate limit exceeded",
            ApiErrorKind::Server => "server error",
        }
    }

    /// Limit metadata for any member of the 402 family.
    #[must_use]
    pub fn feature_limit(&self) -> Option<&FeatureLimit> {
        match self {
            ApiErrorKind::FeatureHardLimit(limit)
            | ApiErrorKind::FeatureSoftLimit(limit)
            | ApiErrorKind::FeatureTotalLimit(limit)
            | ApiErrorKind::FeatureLimit(limit) => Some(limit),
            _ => None,
        }
    }
}

/// What was sent, kept for diagnostics. `Authorization` is redacted.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

/// What came back, including the raw body.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseSnapshot {
    /// Body decoded as UTF-8, lossy.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A failed exchange with the remote API, translated into a typed kind.
#[derive(Debug, Clone, Error)]
#[error("{} (status={})", .kind.name(), .response.status)]
pub struct ApiError {
    kind: ApiErrorKind,
    request: RequestSnapshot,
    response: ResponseSnapshot,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: ApiErrorKind, request: RequestSnapshot, response: ResponseSnapshot) -> Self {
        Self {
            kind,
            request,
            response,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    #[must_use]
    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    #[must_use]
    pub fn response(&self) -> &ResponseSnapshot {
        &self.response
    }
}
