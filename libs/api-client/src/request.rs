use std::io;
use std::path::{Path, PathBuf};

use http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderValue};
use http::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::credential::Credential;
use crate::error::ClientError;
use crate::provider::Provider;

/// A file to send as the `file` part of a multipart upload.
#[derive(Debug, Clone, Default)]
pub struct FileUpload {
    path: PathBuf,
    original_name: String,
    data: Option<Value>,
}

impl FileUpload {
    /// Upload `path` under `original_name`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            data: None,
        }
    }

    /// Attach auxiliary data, sent as a JSON `data` part.
    ///
    /// # Errors
    /// Returns [`ClientError::Serialization`] if `data` cannot be serialized.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, ClientError> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    fn has_file(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }
}

/// Request payload handed to [`ApiClient::call_api`](crate::ApiClient::call_api).
#[derive(Debug, Clone)]
pub enum Payload {
    /// Structured data sent as a JSON body.
    Json(Value),
    /// A file sent as `multipart/form-data`.
    File(FileUpload),
}

impl Payload {
    /// Serialize `value` into a JSON payload.
    ///
    /// # Errors
    /// Returns [`ClientError::Serialization`] if `value` cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<FileUpload> for Payload {
    fn from(upload: FileUpload) -> Self {
        Payload::File(upload)
    }
}

/// Build a dispatch-ready request.
///
/// The bearer credential is always attached; `Accept-Language` only when a
/// language is set. A file upload with an empty path falls back to its
/// auxiliary data as a JSON body.
pub(crate) async fn build_request(
    provider: &dyn Provider,
    credential: &Credential,
    language: Option<&HeaderValue>,
    method: Method,
    url: &str,
    payload: Option<Payload>,
) -> Result<reqwest::Request, ClientError> {
    let mut builder = provider.get_authenticated_request(method, url, credential);

    if let Some(language) = language {
        builder = builder.header(ACCEPT_LANGUAGE, language.clone());
    }

    builder = match payload {
        Some(Payload::File(upload)) if upload.has_file() => {
            builder.multipart(multipart_form(upload).await?)
        }
        Some(Payload::File(upload)) => match upload.data {
            Some(data) => json_body(builder, &data)?,
            None => builder,
        },
        Some(Payload::Json(value)) => json_body(builder, &value)?,
        None => builder,
    };

    Ok(builder.build()?)
}

fn json_body(
    builder: reqwest::RequestBuilder,
    value: &Value,
) -> Result<reqwest::RequestBuilder, ClientError> {
    let body = serde_json::to_vec(value)?;
    Ok(builder
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body))
}

/// `file` part plus an optional JSON `data` part. A file missing on disk is
/// sent as an empty part with an empty filename and no content type.
async fn multipart_form(upload: FileUpload) -> Result<Form, ClientError> {
    let file_part = match tokio::fs::read(&upload.path).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(&upload.path).first_or_octet_stream();
            Part::bytes(contents)
                .file_name(upload.original_name)
                .mime_str(mime.essence_str())?
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %upload.path.display(), "upload file not found, sending empty part");
            Part::bytes(Vec::new()).file_name(String::new())
        }
        Err(e) => return Err(ClientError::Io(e)),
    };

    let mut form = Form::new().part("file", file_part);
    if let Some(data) = upload.data {
        form = form.text("data", serde_json::to_string(&data)?);
    }
    Ok(form)
}
