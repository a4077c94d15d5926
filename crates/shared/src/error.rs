use serde::{Deserialize, Serialize};

/// Failure body the backend (and the wallet proxy) send alongside non-2xx
/// statuses: `{ "success": false, "message": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
