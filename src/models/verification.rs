// Verification endpoint payloads
//
// Two API generations coexist on the backend: the legacy
// `verification/request/*` surface and the newer `confirm/verification/*`
// one. Both are mirrored here as they appear on the wire.

use serde::{Deserialize, Serialize};

/// Lifecycle states the backend reports. The set is open-ended; unknown
/// values deserialize to `Unknown` instead of failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Expired,
    Cancelled,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationContext {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    pub style: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceTemplate {
    #[serde(rename = "type")]
    pub kind: String,
    pub render_style: String,
    pub title: String,
    pub options: Vec<ChoiceOption>,
}

/// A single verification request as returned by the confirm API.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationDetail {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_name: String,
    pub status: VerificationStatus,
    pub created_at: String,
    pub expires_in_seconds: i64,
    pub complete: bool,
    pub code: String,
    pub token: String,
    pub pending_expiration: String,
    pub verified_at: Option<String>,
    pub attempts: i64,
    pub display_template: Option<String>,
    pub context: VerificationContext,
    /// Raw JSON string; see [`VerificationDetail::choice_template`].
    #[serde(rename = "choice_template")]
    pub choice_template_raw: Option<String>,
}

impl VerificationDetail {
    /// Parse the embedded choice template. The backend ships it as a JSON
    /// string inside the JSON payload; a malformed template renders as none.
    pub fn choice_template(&self) -> Option<ChoiceTemplate> {
        self.choice_template_raw
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationDataWrapper {
    pub verification: VerificationDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationVerifyResponse {
    pub success: bool,
    pub code: i64,
    pub message: String,
    pub data: Option<VerificationDataWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationStatusResponse {
    pub success: bool,
    pub code: i64,
    pub data: Option<VerificationDataWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationListResponse {
    pub success: bool,
    pub code: i64,
    pub message: String,
    pub data: Option<Vec<VerificationDetail>>,
    pub meta: Option<MetaPagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationCancelResponse {
    pub success: bool,
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaPagination {
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
    #[serde(rename = "pageCount")]
    pub page_count: i64,
    pub from: i64,
    pub to: i64,
}

// --- Legacy `verification/request/*` surface ---

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmList {
    pub success: bool,
    pub data: Vec<ConfirmRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRecord {
    pub id: String,
    pub verification_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: String,
    pub initiated_by: String,
    pub status: VerificationStatus,
    pub context_data: String,
    pub initiated_at: String,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
    pub result: Option<ConfirmResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmResult {
    pub id: String,
    pub verification_id: String,
    pub device_id: String,
    pub action: String,
    pub biometric_verified: String,
    pub verification_code: Option<String>,
    pub reject_reason: Option<String>,
    pub verified_at: String,
    pub created_at: String,
}

/// Fields of the legacy `verification/request/verify` form.
#[derive(Debug, Clone)]
pub struct VerifyAction {
    pub action: String,
    pub device_id: String,
    pub biometric_verified: bool,
    pub verification_code: Option<String>,
    pub reject_reason: Option<String>,
    pub verification_id: String,
}

/// Legacy verify response.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: Option<String>,
}
