// src/provider/mod.rs - Answer providers

pub mod gemini;
pub mod offline;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::infra::config::{ProviderConfig, ProviderKind};
use crate::infra::errors::TutorError;

/// MIME type declared for every inline image part.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Appended to the prompt when an image was requested but could not be used.
pub const IMAGE_UNAVAILABLE_NOTE: &str =
    "(Lưu ý: Không thể xử lý hình ảnh đính kèm. Hãy trả lời dựa trên nội dung câu hỏi ở trên.)";

/// Image accompanying a question, in whatever shape the caller obtained it.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw JPEG bytes.
    Jpeg(Vec<u8>),
    /// Base64 text from the client, possibly with a `data:` URL prefix.
    Base64(String),
    /// The caller tried to obtain an image and failed.
    Unavailable { reason: String },
}

/// Something that turns a composed prompt into answer text.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    fn id(&self) -> &str;

    /// One independent round trip. Every failure comes back as a `TutorError`
    /// whose `Display` is safe to show the student.
    async fn dispatch(
        &self,
        prompt: &str,
        api_key: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<String, TutorError>;
}

/// Sampling parameters sent with every request. Not tunable per call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_k: 32,
            top_p: 0.95,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

/// Block harassment, hate, sexual and dangerous content at medium and above.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: "BLOCK_MEDIUM_AND_ABOVE",
    })
    .collect()
}

/// Build the provider selected in config.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn AnswerProvider>, TutorError> {
    match config.kind {
        ProviderKind::Gemini => Ok(Arc::new(gemini::GeminiProvider::new(
            gemini::GeminiSettings::from_config(config),
        )?)),
        ProviderKind::Offline => Ok(Arc::new(offline::OfflineProvider::new())),
    }
}
