//! REST API client core
//!
//! The shared request pipeline behind every endpoint wrapper of the API:
//!
//! - OAuth2 bearer credentials, refreshed lazily when absent or expired
//! - Request building with JSON bodies or multipart file uploads
//! - Dispatch over `reqwest`
//! - Translation of 4xx/5xx answers into typed [`ApiErrorKind`]s
//! - Query-string composition for list/get/pdf/preview actions
//!
//! # Examples
//!
//! ## Async Usage
//!
//! ```no_run
//! use api_client::{ApiClient, ApiClientConfig, Endpoint, ListParams};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiClientConfig::new(
//!     "https://api.example.com/v1",
//!     "https://auth.example.com/oauth/token",
//!     "client-id",
//!     "client-secret",
//! )
//! .with_scopes(["invoices:read"]);
//! let client = ApiClient::from_config(config)?;
//!
//! let invoices = Endpoint::new(&client, "/invoices");
//! let params = ListParams::new().filter("status:paid").limit(10);
//! let page: serde_json::Value = invoices.list(Some(&params)).await?.json()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Blocking Usage
//!
//! ```no_run
//! use api_client::{ApiClient, ApiClientConfig, Method, query};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::from_config(ApiClientConfig::from_env()?)?;
//! let url = query::get_url(client.base_url(), "/invoices/42", None);
//! let response = client.call_api_blocking(Method::GET, &url, None)?;
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Handling API Errors
//!
//! ```no_run
//! use api_client::{ApiClient, ApiErrorKind, ClientError, Method};
//!
//! # async fn example(client: &ApiClient, url: &str) {
//! match client.call_api(Method::DELETE, url, None).await {
//!     Ok(_) => {}
//!     Err(ClientError::Api(err)) => match err.kind() {
//!         ApiErrorKind::NotFound { entity_type } => eprintln!("missing {entity_type:?}"),
//!         ApiErrorKind::RateLimit => eprintln!("slow down"),
//!         other => eprintln!("{} ({})", other.name(), err.status()),
//!     },
//!     Err(other) => eprintln!("{other}"),
//! }
//! # }
//! ```

mod client;
mod config;
mod credential;
mod endpoint;
mod error;
mod provider;
pub mod query;
mod request;
mod response;
mod token;
mod translate;

// Re-export public API
pub use client::ApiClient;
pub use config::{ApiClientConfig, validate_base_url};
pub use credential::{Credential, GrantType, TokenParams};
pub use endpoint::Endpoint;
pub use error::{
    ApiError, ApiErrorKind, ClientError, CredentialError, FeatureLimit, RequestSnapshot,
    ResponseSnapshot, ValidationErrors,
};
pub use provider::{GenericProvider, Provider};
pub use query::{GetParams, ListParams, PdfParams, PreviewParams, QueryParams};
pub use request::{FileUpload, Payload};
pub use response::Response;
pub use translate::translate;

// Re-export commonly used types from dependencies
pub use http::{Method, StatusCode};
