// Authentication error taxonomy

use thiserror::Error;

/// Failures raised while producing a usable access token.
///
/// The request pipeline aborts with one of these before the protected
/// request touches the network; `safe_call` folds them into
/// `Outcome::GenericError` so a protected call never goes out
/// unauthenticated.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No access token in the credential store.
    #[error("no access token stored")]
    NoAccessToken,

    /// Access token is stale and there is no refresh token to trade in.
    #[error("no refresh token stored")]
    NoRefreshToken,

    /// The backend rejected the refresh call or it never completed.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The credential store itself failed.
    #[error("credential store error: {0}")]
    Store(#[source] anyhow::Error),
}
