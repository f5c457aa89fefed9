// src/provider/gemini.rs - Google Generative Language (Gemini) dispatcher

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::time::{Duration, Instant};

use super::{
    default_safety_settings, AnswerProvider, GenerationConfig, ImageInput, SafetySetting,
    IMAGE_MIME_TYPE, IMAGE_UNAVAILABLE_NOTE,
};
use crate::infra::config::ProviderConfig;
use crate::infra::errors::TutorError;

/// Fixed at construction; nothing here can be changed per request.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub generation: GenerationConfig,
    pub safety: Vec<SafetySetting>,
}

impl GeminiSettings {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_seconds.max(1)),
            generation: GenerationConfig::default(),
            safety: default_safety_settings(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

pub struct GeminiProvider {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(settings: GeminiSettings) -> Result<Self, TutorError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| TutorError::Config(format!("không tạo được HTTP client: {e}")))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
        )
    }

    /// Build the generateContent body: prompt first, then the image if any.
    pub fn build_request_body(&self, prompt: &str, image_base64: Option<&str>) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": prompt })];
        if let Some(data) = image_base64 {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": IMAGE_MIME_TYPE,
                    "data": data,
                }
            }));
        }

        serde_json::json!({
            "contents": [{ "parts": parts }],
            "generationConfig": self.settings.generation,
            "safetySettings": self.settings.safety,
        })
    }
}

/// Turn the caller's image into base64 payload, or the reason it can't be sent.
fn prepare_image(image: ImageInput) -> Result<String, String> {
    match image {
        ImageInput::Jpeg(bytes) if bytes.is_empty() => Err("ảnh rỗng".into()),
        ImageInput::Jpeg(bytes) => Ok(BASE64.encode(bytes)),
        ImageInput::Base64(text) => {
            let payload = strip_data_url(&text);
            let bytes = BASE64
                .decode(payload.trim())
                .map_err(|e| format!("base64 không hợp lệ: {e}"))?;
            if bytes.is_empty() {
                return Err("ảnh rỗng".into());
            }
            Ok(BASE64.encode(bytes))
        }
        ImageInput::Unavailable { reason } => Err(reason),
    }
}

/// `data:image/png;base64,AAAA` → `AAAA`. Plain base64 passes through.
pub(crate) fn strip_data_url(text: &str) -> &str {
    match text.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => text,
    }
}

/// `candidates[0].content.parts[0].text`, if the response has it.
pub fn extract_text(response: &serde_json::Value) -> Option<String> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(String::from)
}

/// Provider's own explanation from an error body, when it parses.
fn error_detail(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed["error"]["message"].as_str().map(String::from)
}

#[async_trait]
impl AnswerProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn dispatch(
        &self,
        prompt: &str,
        api_key: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<String, TutorError> {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            tracing::warn!("No API key available; skipping provider call");
            return Err(TutorError::MissingCredential);
        };

        let mut prompt = prompt.to_string();
        let image_data = match image.map(prepare_image) {
            Some(Ok(data)) => Some(data),
            Some(Err(reason)) => {
                tracing::warn!("Image dropped from request: {reason}");
                prompt.push_str("\n\n");
                prompt.push_str(IMAGE_UNAVAILABLE_NOTE);
                None
            }
            None => None,
        };

        let body = self.build_request_body(&prompt, image_data.as_deref());
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Gemini request failed: {e}");
                TutorError::Transport {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        tracing::debug!(
            model = %self.settings.model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            has_image = image_data.is_some(),
            "Gemini responded"
        );

        let text = response.text().await.map_err(|e| TutorError::Transport {
            message: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            let detail = error_detail(&text);
            tracing::warn!("Gemini returned HTTP {status}: {}", detail.as_deref().unwrap_or("-"));
            return Err(match status.as_u16() {
                400 => TutorError::InvalidCredential { detail },
                403 => TutorError::PermissionDenied { detail },
                code => TutorError::Upstream {
                    status: code,
                    detail,
                },
            });
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| TutorError::UnexpectedResponse {
                message: format!("invalid JSON: {e}"),
            })?;

        extract_text(&parsed).ok_or_else(|| {
            let reason = parsed["promptFeedback"]["blockReason"]
                .as_str()
                .map(|r| format!("blocked: {r}"))
                .unwrap_or_else(|| "missing candidates[0].content.parts[0].text".into());
            tracing::warn!("Unexpected Gemini response shape ({reason})");
            TutorError::UnexpectedResponse { message: reason }
        })
    }
}
