//! Blocking (sync) usage example for the REST API client
//!
//! Suitable for build scripts and small tools without an async runtime.
//!
//! To run this example:
//! ```bash
//! export API_CLIENT_BASE_URL="https://api.example.com/v1"
//! export API_CLIENT_TOKEN_URL="https://auth.example.com/oauth/token"
//! export API_CLIENT_ID="client-id"
//! export API_CLIENT_SECRET="client-secret"
//! export API_CLIENT_SCOPES="invoices:read"   # Optional
//! cargo run --example blocking_usage
//! ```

use api_client::{ApiClient, ApiClientConfig, ApiErrorKind, ClientError, ListParams, Method, query};

fn main() -> anyhow::Result<()> {
    let client = ApiClient::from_config(ApiClientConfig::from_env()?)?;

    println!("=== Example 1: Token Exchange ===\n");

    let credential = client.get_access_token_blocking()?;
    println!("Expires at: {:?}\n", credential.expires_at());

    println!("=== Example 2: Filtered List ===\n");

    let params = ListParams::new().filter("status:paid").limit(5);
    let url = query::list_url(client.base_url(), "/invoices", Some(&params));
    let response = client.call_api_blocking(Method::GET, &url, None)?;

    println!("Status: {}", response.status());
    let page: serde_json::Value = response.json()?;
    println!("Page: {page:#}\n");

    println!("=== Example 3: Typed Error ===\n");

    let url = query::get_url(client.base_url(), "/invoices/does-not-exist", None);
    match client.call_api_blocking(Method::GET, &url, None) {
        Ok(response) => println!("Unexpected success: {}", response.status()),
        Err(ClientError::Api(err)) => match err.kind() {
            ApiErrorKind::NotFound { entity_type } => {
                println!("Not found (entity type: {entity_type:?})");
            }
            other => println!("{} ({})", other.name(), err.status()),
        },
        Err(other) => return Err(other.into()),
    }

    Ok(())
}
