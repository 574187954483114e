// Auth endpoint payloads

use serde::Deserialize;

/// Login response. The backend returns either the full token set or a
/// server-code challenge (`status` + `message` + `serverCode`), never both.
/// The `serverCode` key is camelCase on the wire while the token fields are
/// snake_case.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub status: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "serverCode")]
    pub server_code: Option<String>,
    pub name: Option<String>,
    pub code: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Refresh response. The refresh token may rotate; whatever comes back is
/// what gets persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    pub name: Option<String>,
}

/// Structured error body the backend attaches to failure statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub name: String,
    pub message: String,
    pub code: i64,
    pub status: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugVerifyResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugUnverifyResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
}
