use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Successful API response with a fully buffered body.
#[derive(Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl Response {
    /// Create a response from buffered bytes
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body bytes
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the body
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    /// Returns [`ClientError::Serialization`] if the body is not valid JSON
    /// for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Return the body as a string
    ///
    /// # Errors
    /// Returns [`ClientError::Serialization`] if the body is not UTF-8.
    pub fn text(&self) -> Result<&str, ClientError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| ClientError::Serialization(format!("Invalid UTF-8: {e}")))
    }

    /// Whether the body is empty (e.g. 204 No Content)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
