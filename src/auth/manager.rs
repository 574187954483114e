// Token lifecycle
//
// Refresh is lazy: a protected request that observes a stale access token
// triggers it, there is no background timer. Refreshes are single-flight:
// concurrent requests queue on the refresh lock and re-check the store
// instead of issuing duplicates.

use reqwest::Client;
use tokio::sync::Mutex;

use super::store::CredentialStore;
use super::validator;
use crate::error::AuthError;
use crate::models::auth::TokenResponse;

pub struct AuthManager {
    /// Shared credential store, also written by login/logout.
    store: CredentialStore,

    /// HTTP client for refresh requests.
    client: Client,

    /// Absolute URL of the refresh endpoint.
    refresh_url: String,

    /// Seconds before nominal expiry at which a token counts as stale.
    margin_secs: i64,

    /// Serializes refresh attempts.
    refresh_lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(store: CredentialStore, client: Client, refresh_url: String, margin_secs: i64) -> Self {
        Self {
            store,
            client,
            refresh_url,
            margin_secs,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Produce an access token valid for at least the configured margin,
    /// refreshing through the backend when the stored one has gone stale.
    ///
    /// Fails without touching the network when no access token is stored,
    /// and without touching the refresh endpoint when no refresh token is.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let token = self
            .stored_access_token()
            .await?
            .ok_or(AuthError::NoAccessToken)?;

        if !validator::is_expired(&token, self.margin_secs) {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // A request queued behind us may have already refreshed.
        if let Some(token) = self.stored_access_token().await? {
            if !validator::is_expired(&token, self.margin_secs) {
                return Ok(token);
            }
        }

        self.refresh_locked().await
    }

    async fn stored_access_token(&self) -> Result<Option<String>, AuthError> {
        self.store.access_token().await.map_err(AuthError::Store)
    }

    /// Perform the refresh round-trip. Caller holds the refresh lock.
    ///
    /// On failure the stored tokens are left untouched; they stay until an
    /// explicit logout.
    async fn refresh_locked(&self) -> Result<String, AuthError> {
        let refresh_token = self
            .store
            .refresh_token()
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::NoRefreshToken)?;

        tracing::debug!("Access token stale, refreshing");

        let response = self
            .client
            .post(self.refresh_url.as_str())
            .form(&[("refresh_token", refresh_token.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Token refresh rejected");
            return Err(AuthError::RefreshFailed(format!("{} - {}", status, body)));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        // Persist exactly what came back; the refresh token may rotate.
        self.store
            .save_tokens(&tokens.access_token, &tokens.refresh_token)
            .await
            .map_err(AuthError::Store)?;

        tracing::debug!("Access token refreshed");

        Ok(tokens.access_token)
    }
}
