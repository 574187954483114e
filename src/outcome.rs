// Result classification for remote calls
//
// Every facade operation funnels through `safe_call`, which turns any way a
// call can go wrong into exactly one `Outcome` variant. Classification never
// fails and never panics.

use std::future::Future;

use reqwest::StatusCode;
use thiserror::Error;

use crate::error::AuthError;
use crate::models::auth::ErrorResponse;

/// Failure raised inside the request pipeline, before classification.
#[derive(Error, Debug)]
pub enum CallError {
    /// The transport layer failed: connect, timeout, body I/O, decode.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {code}: {message}")]
    Status {
        code: u16,
        message: String,
        body: String,
    },

    /// The pipeline could not produce a usable access token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Classified outcome of a remote call. Exactly one variant per call.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// Transport-level failure; the request may never have reached the
    /// backend.
    NetworkError {
        message: Option<String>,
        source: Option<reqwest::Error>,
    },
    /// 4xx response.
    ClientError {
        code: u16,
        message: Option<String>,
        body: Option<String>,
    },
    /// 5xx response.
    ServerError {
        code: u16,
        message: Option<String>,
        body: Option<String>,
    },
    /// Everything that fits no other bucket, auth aborts included.
    GenericError {
        code: Option<u16>,
        message: Option<String>,
        source: Option<anyhow::Error>,
    },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The `AuthError` behind a `GenericError`, if that is what aborted the
    /// call.
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Outcome::GenericError {
                source: Some(source),
                ..
            } => source.downcast_ref::<AuthError>(),
            _ => None,
        }
    }
}

/// Run `call` and classify however it ends.
pub async fn safe_call<T, F>(call: F) -> Outcome<T>
where
    F: Future<Output = Result<T, CallError>>,
{
    match call.await {
        Ok(value) => Outcome::Success(value),
        Err(CallError::Transport(e)) => {
            // A body that arrived but would not parse is not a connectivity
            // problem.
            if e.is_decode() {
                tracing::warn!("Failed to decode response: {}", e);
                Outcome::GenericError {
                    code: None,
                    message: Some(e.to_string()),
                    source: Some(e.into()),
                }
            } else {
                tracing::warn!("Transport failure: {}", e);
                Outcome::NetworkError {
                    message: Some(e.to_string()),
                    source: Some(e),
                }
            }
        }
        Err(CallError::Status {
            code,
            message,
            body,
        }) => {
            tracing::warn!(code, "Request failed: {}", message);
            match code {
                400..=499 => Outcome::ClientError {
                    code,
                    message: Some(message),
                    body: Some(body),
                },
                500..=599 => Outcome::ServerError {
                    code,
                    message: Some(message),
                    body: Some(body),
                },
                _ => Outcome::GenericError {
                    code: Some(code),
                    message: Some(message),
                    source: None,
                },
            }
        }
        Err(CallError::Auth(e)) => {
            tracing::warn!("Request aborted: {}", e);
            Outcome::GenericError {
                code: None,
                message: Some(e.to_string()),
                source: Some(e.into()),
            }
        }
        Err(CallError::Other(e)) => Outcome::GenericError {
            code: None,
            message: Some(e.to_string()),
            source: Some(e),
        },
    }
}

/// Build a `CallError::Status` from a failure response.
///
/// The error body is parsed into the backend's error schema on a best-effort
/// basis; when that fails the HTTP reason phrase stands in and the raw body
/// is still carried.
pub(crate) fn status_error(status: StatusCode, body: String) -> CallError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        });

    CallError::Status {
        code: status.as_u16(),
        message,
        body,
    }
}
