//! Request and response bodies for the redaction endpoints.

use netredact_core::RedactMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RedactRequest {
    pub text: String,
    #[serde(default)]
    pub mode: RedactMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedactResponse {
    pub mapping_id: Uuid,
    pub redacted_text: String,
    pub mapping_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
