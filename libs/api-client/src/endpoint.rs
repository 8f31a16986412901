use std::fmt::Display;

use http::Method;
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::query::{
    GetParams, ListParams, PdfParams, PreviewParams, get_url, list_url, pdf_url, preview_url,
};
use crate::request::{FileUpload, Payload};
use crate::response::Response;

/// Thin CRUD wrapper over one resource collection, e.g. `/invoices`.
///
/// Builds URLs with the [`query`](crate::query) builders and hands every call
/// to [`ApiClient::call_api`].
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    client: &'a ApiClient,
    path: &'a str,
}

impl<'a> Endpoint<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient, path: &'a str) -> Self {
        Self { client, path }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{id}", self.path)
    }

    /// `GET {path}` with list parameters.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn list(&self, params: Option<&ListParams>) -> Result<Response, ClientError> {
        let url = list_url(self.client.base_url(), self.path, params);
        self.client.call_api(Method::GET, &url, None).await
    }

    /// `GET {path}/{id}`.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn get(
        &self,
        id: impl Display,
        params: Option<&GetParams>,
    ) -> Result<Response, ClientError> {
        let url = get_url(self.client.base_url(), &self.item_path(id), params);
        self.client.call_api(Method::GET, &url, None).await
    }

    /// `POST {path}` with a JSON body.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`], or [`ClientError::Serialization`]
    /// if `body` cannot be serialized.
    pub async fn create<T: Serialize>(&self, body: &T) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.client.base_url(), self.path);
        self.client
            .call_api(Method::POST, &url, Some(Payload::json(body)?))
            .await
    }

    /// `PATCH {path}/{id}` with a JSON body.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`], or [`ClientError::Serialization`]
    /// if `body` cannot be serialized.
    pub async fn update<T: Serialize>(
        &self,
        id: impl Display,
        body: &T,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.client.base_url(), self.item_path(id));
        self.client
            .call_api(Method::PATCH, &url, Some(Payload::json(body)?))
            .await
    }

    /// `DELETE {path}/{id}`.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn delete(&self, id: impl Display) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.client.base_url(), self.item_path(id));
        self.client.call_api(Method::DELETE, &url, None).await
    }

    /// `GET {path}/{id}/pdf`.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn pdf(
        &self,
        id: impl Display,
        params: Option<&PdfParams>,
    ) -> Result<Response, ClientError> {
        let path = format!("{}/pdf", self.item_path(id));
        let url = pdf_url(self.client.base_url(), &path, params);
        self.client.call_api(Method::GET, &url, None).await
    }

    /// `GET {path}/{id}/preview`.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn preview(
        &self,
        id: impl Display,
        params: Option<&PreviewParams>,
    ) -> Result<Response, ClientError> {
        let path = format!("{}/preview", self.item_path(id));
        let url = preview_url(self.client.base_url(), &path, params);
        self.client.call_api(Method::GET, &url, None).await
    }

    /// `POST {path}` as a multipart file upload.
    ///
    /// # Errors
    /// Any error of [`ApiClient::call_api`].
    pub async fn upload(&self, upload: FileUpload) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.client.base_url(), self.path);
        self.client
            .call_api(Method::POST, &url, Some(Payload::File(upload)))
            .await
    }
}
