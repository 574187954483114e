// Device identity reported to the backend

use serde::Serialize;

/// Stable machine fingerprint derived from the hostname.
pub fn fingerprint() -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let mut hasher = DefaultHasher::new();
    hostname.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Device descriptor submitted alongside verification answers.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub device_name: String,
    pub app_version: String,
    pub os_type: String,
}

impl DeviceInfo {
    pub fn current() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            device_id: fingerprint(),
            device_name: hostname,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os_type: std::env::consts::OS.to_string(),
        }
    }

    /// JSON string form the verify endpoint expects in its `device_info`
    /// field.
    pub fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
