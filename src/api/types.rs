// src/api/types.rs - Request and response bodies

use serde::{Deserialize, Serialize};

use crate::core::types::{ConversationTurn, Mode, SolutionMode};
use crate::infra::credentials::CredentialOrigin;

/// Body of `POST /send_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub solution_mode: Option<SolutionMode>,
    /// Per-request credential; beats the session and environment keys.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub response: String,
    pub success: bool,
    pub subject: String,
    pub mode: Mode,
    pub solution_mode: SolutionMode,
}

#[derive(Debug, Serialize)]
pub struct ImageVariants {
    /// JPEG data URL of the upload as it was sent to the model.
    pub original: String,
    /// PNG data URL of the contrast-enhanced grayscale variant.
    pub enhanced: String,
}

#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub response: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageVariants>,
    /// Something went partly wrong (image unreadable, OCR off) but we still answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
    pub source: Option<CredentialOrigin>,
    pub masked: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
    pub default_subject: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
