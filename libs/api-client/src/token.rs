use std::collections::BTreeSet;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::debug;

use crate::credential::{Credential, GrantType, TokenParams};
use crate::error::CredentialError;
use crate::provider::Provider;

#[derive(Debug, Default)]
struct TokenState {
    credential: Option<Credential>,
    refresh_token: Option<SecretString>,
    scopes: BTreeSet<String>,
}

/// Holds the bearer credential and refreshes it lazily.
///
/// The state lock is held for the whole exchange, so concurrent callers on a
/// shared pipeline wait for one refresh instead of each starting their own.
#[derive(Debug, Default)]
pub(crate) struct TokenManager {
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Replaces the refresh credential and drops any held access credential.
    pub(crate) fn set_refresh_token(&mut self, refresh_token: SecretString) {
        let state = self.state.get_mut();
        state.refresh_token = Some(refresh_token);
        state.credential = None;
    }

    pub(crate) fn set_credential(&mut self, credential: Credential) {
        self.state.get_mut().credential = Some(credential);
    }

    pub(crate) fn set_scopes(&mut self, scopes: BTreeSet<String>) {
        self.state.get_mut().scopes = scopes;
    }

    /// Returns a usable credential, exchanging a grant when none is held or
    /// the held one has expired.
    pub(crate) async fn ensure_valid_credential(
        &self,
        provider: &dyn Provider,
    ) -> Result<Credential, CredentialError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(credential) = state.credential.as_ref().filter(|c| !c.is_expired_at(now)) {
            return Ok(credential.clone());
        }

        let (grant, refresh_token) = match state.refresh_token.clone() {
            Some(refresh_token) => (GrantType::RefreshToken, Some(refresh_token)),
            None => (GrantType::ClientCredentials, None),
        };
        debug!(grant = %grant, "refreshing access token");

        let params = TokenParams {
            refresh_token,
            scopes: state.scopes.clone(),
        };
        let credential = provider.get_access_token(grant, params).await?;
        state.credential = Some(credential.clone());
        Ok(credential)
    }
}
