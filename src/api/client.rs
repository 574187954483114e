// API facade and authenticated request pipeline
//
// Every operation goes through `request()`, which decides from the path
// whether a bearer token is attached, and through `safe_call`, which
// classifies the result. Protected requests never leave without a token.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Method, RequestBuilder, Url};

use crate::auth::manager::AuthManager;
use crate::auth::store::CredentialStore;
use crate::device::{self, DeviceInfo};
use crate::error::AuthError;
use crate::models::auth::{
    DebugUnverifyResponse, DebugVerifyResponse, LoginResponse, LogoutResponse, TokenResponse,
    UserInfoResponse,
};
use crate::models::verification::{
    ConfirmList, VerificationCancelResponse, VerificationListResponse, VerificationResponse,
    VerificationStatusResponse, VerificationVerifyResponse, VerifyAction,
};
use crate::outcome::{safe_call, status_error, CallError, Outcome};

/// Endpoints served without a bearer token. Everything else is protected.
const PUBLIC_ENDPOINTS: [&str; 4] = [
    "auth/identity/login",
    "auth/identity/refresh-token",
    "auth/identity/tmp-verify",
    "auth/identity/tmp-delete",
];

fn requires_auth(path: &str) -> bool {
    !PUBLIC_ENDPOINTS.iter().any(|public| path.contains(public))
}

/// How a login attempt concluded, beyond plain failure.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Tokens issued and persisted.
    Authenticated { name: Option<String> },

    /// The account requires a server-code round-trip. The code is persisted
    /// and resubmitted automatically on the next attempt.
    ServerCodeChallenge {
        code: String,
        message: Option<String>,
    },
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth: Arc<AuthManager>,
    store: CredentialStore,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        store: CredentialStore,
        margin_secs: i64,
        connect_timeout_secs: u64,
        request_timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        // Url::join drops the last path segment without this.
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let refresh_url = base_url
            .join("auth/identity/refresh-token")
            .context("Invalid base URL")?;

        let auth = Arc::new(AuthManager::new(
            store.clone(),
            http.clone(),
            refresh_url.to_string(),
            margin_secs,
        ));

        Ok(Self {
            http,
            base_url,
            auth,
            store,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Build a request for `path`, attaching a bearer token when the path is
    /// not on the public allowlist. Aborts before any network traffic when
    /// no usable token can be produced.
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CallError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CallError::Other(anyhow::anyhow!("invalid request path {path}: {e}")))?;

        let mut builder = self.http.request(method, url);
        if requires_auth(path) {
            let token = self.auth.access_token().await?;
            tracing::debug!(path, "Attaching bearer token");
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, CallError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        Ok(response.json::<T>().await?)
    }

    // --- Auth operations ---

    /// Log in and handle the response: a full token set is persisted, a
    /// server-code challenge persists the code for the next attempt. The
    /// previously stored server code (empty when absent) rides along in the
    /// request.
    pub async fn login(&self, username: &str, password: &str) -> Outcome<LoginOutcome> {
        safe_call(async {
            let server_code = self
                .store
                .server_code()
                .await
                .map_err(|e| CallError::Auth(AuthError::Store(e)))?
                .unwrap_or_default();

            let device = device::fingerprint();
            let form = [
                ("username", username),
                ("password", password),
                ("deviceInfo", device.as_str()),
                ("serverCode", server_code.as_str()),
            ];

            let builder = self.request(Method::POST, "auth/identity/login").await?;
            let response: LoginResponse = self.execute(builder.form(&form)).await?;

            if let (Some(access), Some(refresh)) = (
                response.access_token.as_deref(),
                response.refresh_token.as_deref(),
            ) {
                self.store
                    .save_tokens(access, refresh)
                    .await
                    .map_err(|e| CallError::Auth(AuthError::Store(e)))?;
                tracing::info!("Login successful, tokens stored");
                return Ok(LoginOutcome::Authenticated {
                    name: response.name,
                });
            }

            if let Some(code) = response.server_code {
                self.store
                    .save_server_code(&code)
                    .await
                    .map_err(|e| CallError::Auth(AuthError::Store(e)))?;
                tracing::info!("Login answered with a server-code challenge");
                return Ok(LoginOutcome::ServerCodeChallenge {
                    code,
                    message: response.message,
                });
            }

            Err(CallError::Other(anyhow::anyhow!(
                "login response carried neither tokens nor a server code"
            )))
        })
        .await
    }

    /// Trade a refresh token for a fresh pair. The pipeline does this on its
    /// own; this surface exists for tooling. Nothing is persisted here.
    pub async fn refresh_token(&self, refresh_token: &str) -> Outcome<TokenResponse> {
        safe_call(async {
            let builder = self
                .request(Method::POST, "auth/identity/refresh-token")
                .await?;
            self.execute(builder.form(&[("refresh_token", refresh_token)]))
                .await
        })
        .await
    }

    /// Log out. Local tokens are cleared even when the backend call fails.
    pub async fn logout(&self) -> Outcome<LogoutResponse> {
        let outcome = safe_call(async {
            let builder = self.request(Method::POST, "auth/identity/logout").await?;
            self.execute::<LogoutResponse>(builder).await
        })
        .await;

        if let Err(e) = self.store.remove_tokens().await {
            tracing::warn!("Failed to clear stored tokens: {:#}", e);
        } else {
            tracing::info!("Stored tokens cleared");
        }

        outcome
    }

    pub async fn user_info(&self) -> Outcome<UserInfoResponse> {
        safe_call(async {
            let builder = self.request(Method::GET, "auth/identity/user-info").await?;
            self.execute(builder).await
        })
        .await
    }

    /// Backend test hook: mark this device verified.
    pub async fn debug_verify_devices(&self) -> Outcome<DebugVerifyResponse> {
        safe_call(async {
            let builder = self.request(Method::GET, "auth/identity/tmp-verify").await?;
            self.execute(builder).await
        })
        .await
    }

    /// Backend test hook: drop device verification.
    pub async fn debug_unverify_devices(&self) -> Outcome<DebugUnverifyResponse> {
        safe_call(async {
            let builder = self.request(Method::GET, "auth/identity/tmp-delete").await?;
            self.execute(builder).await
        })
        .await
    }

    // --- Verification operations (confirm API) ---

    pub async fn pending_verifications(
        &self,
        page: u32,
        page_size: u32,
        sort: &str,
    ) -> Outcome<VerificationListResponse> {
        safe_call(async {
            let builder = self
                .request(Method::GET, "confirm/verification/pending-list")
                .await?
                .query(&[
                    ("page", page.to_string()),
                    ("pageSize", page_size.to_string()),
                    ("sort", sort.to_string()),
                ]);
            self.execute(builder).await
        })
        .await
    }

    pub async fn all_verifications(
        &self,
        page: u32,
        page_size: u32,
        sort: &str,
        status: Option<&str>,
        kind: Option<&str>,
    ) -> Outcome<VerificationListResponse> {
        safe_call(async {
            let mut builder = self
                .request(Method::GET, "confirm/verification/all-list")
                .await?
                .query(&[
                    ("page", page.to_string()),
                    ("pageSize", page_size.to_string()),
                    ("sort", sort.to_string()),
                ]);
            if let Some(status) = status {
                builder = builder.query(&[("status", status)]);
            }
            if let Some(kind) = kind {
                builder = builder.query(&[("type", kind)]);
            }
            self.execute(builder).await
        })
        .await
    }

    /// Answer a verification request. The device descriptor goes out as a
    /// JSON string in the `device_info` field.
    pub async fn verify_verification(
        &self,
        kind: &str,
        token: &str,
        answer: Option<&str>,
    ) -> Outcome<VerificationVerifyResponse> {
        safe_call(async {
            let device_info = DeviceInfo::current().as_json();
            let mut form = vec![
                ("type", kind.to_string()),
                ("token", token.to_string()),
                ("device_info", device_info),
            ];
            if let Some(answer) = answer {
                form.push(("answer", answer.to_string()));
            }

            let builder = self
                .request(Method::POST, "confirm/verification/verify")
                .await?;
            self.execute(builder.form(&form)).await
        })
        .await
    }

    pub async fn verification_status(&self, token: &str) -> Outcome<VerificationStatusResponse> {
        safe_call(async {
            let builder = self
                .request(Method::GET, "confirm/verification/status")
                .await?
                .query(&[("token", token)]);
            self.execute(builder).await
        })
        .await
    }

    pub async fn cancel_verification(&self, token: &str) -> Outcome<VerificationCancelResponse> {
        safe_call(async {
            let builder = self
                .request(Method::DELETE, "confirm/verification/cancel")
                .await?
                .query(&[("token", token)]);
            self.execute(builder).await
        })
        .await
    }

    // --- Legacy verification surface ---

    pub async fn confirm_list(&self) -> Outcome<ConfirmList> {
        safe_call(async {
            let builder = self.request(Method::GET, "verification/request/list").await?;
            self.execute(builder).await
        })
        .await
    }

    pub async fn verify_request(&self, action: &VerifyAction) -> Outcome<VerificationResponse> {
        safe_call(async {
            let mut form = vec![
                ("action", action.action.clone()),
                ("device_id", action.device_id.clone()),
                (
                    "biometric_verified",
                    if action.biometric_verified { "1" } else { "0" }.to_string(),
                ),
                ("verification_id", action.verification_id.clone()),
            ];
            if let Some(code) = &action.verification_code {
                form.push(("verification_code", code.clone()));
            }
            if let Some(reason) = &action.reject_reason {
                form.push(("reject_reason", reason.clone()));
            }

            let builder = self
                .request(Method::POST, "verification/request/verify")
                .await?;
            self.execute(builder.form(&form)).await
        })
        .await
    }
}
