// src/api/handlers.rs - Route handlers

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::session::SessionHandle;
use crate::api::{types::*, ApiState};
use crate::core::types::{Mode, PromptRequest, SolutionMode};
use crate::imaging::{self, ocr, ProcessedImage};
use crate::infra::credentials::mask_key;
use crate::infra::errors::TutorError;
use crate::provider::gemini::strip_data_url;
use crate::provider::{ImageInput, IMAGE_MIME_TYPE};

const DEFAULT_IMAGE_QUESTION: &str = "Hãy giải bài tập trong hình ảnh.";

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn tutor_error_response(err: &TutorError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /send_message - Answer one text question and record it in the session.
pub async fn send_message(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("Rejected send_message body: {}", rejection.body_text());
            return session.attach(error_response(
                StatusCode::BAD_REQUEST,
                format!("Yêu cầu không hợp lệ: {}", rejection.body_text()),
            ));
        }
    };

    if body.message.trim().is_empty() {
        return session.attach(tutor_error_response(&TutorError::empty_message()));
    }

    let request = PromptRequest {
        message: body.message.trim().to_string(),
        subject: state.subject_or_default(body.subject),
        mode: body.mode.unwrap_or_default(),
        solution_mode: body.solution_mode.unwrap_or_default(),
        image_reference: None,
    };

    let session_key = state.sessions.api_key(&session.id);
    let credential = state
        .credentials
        .resolve(body.api_key.as_deref(), session_key.as_deref());

    let exchange = state
        .tutor
        .ask(&request, credential.as_ref().map(|c| c.key.as_str()), None)
        .await;

    if let Some(turn) = exchange.turn {
        state.sessions.append(&session.id, turn);
    }

    session.attach(
        Json(SendMessageResponse {
            response: exchange.result.text,
            success: exchange.result.success,
            subject: request.subject,
            mode: request.mode,
            solution_mode: request.solution_mode,
        })
        .into_response(),
    )
}

/// Fields collected from the `/upload_image` multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Option<Vec<u8>>,
    image_data: Option<String>,
    message: Option<String>,
    subject: Option<String>,
    mode: Option<String>,
    solution_mode: Option<String>,
    api_key: Option<String>,
    extract_text: bool,
    ocr_only: bool,
}

fn form_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, TutorError> {
    let mut form = UploadForm::default();
    let invalid = |e: axum::extract::multipart::MultipartError| {
        TutorError::Validation(format!("Dữ liệu tải lên không hợp lệ: {}", e.body_text()))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "file" => {
                form.file_name = field.file_name().map(String::from);
                form.file = Some(field.bytes().await.map_err(invalid)?.to_vec());
            }
            other => {
                let value = field.text().await.map_err(invalid)?;
                match other {
                    "image_data" => form.image_data = Some(value),
                    "message" => form.message = Some(value),
                    "subject" => form.subject = Some(value),
                    "mode" => form.mode = Some(value),
                    "solution_mode" => form.solution_mode = Some(value),
                    "api_key" => form.api_key = Some(value),
                    "extract_text" => form.extract_text = form_flag(&value),
                    "ocr_only" => form.ocr_only = form_flag(&value),
                    _ => tracing::debug!("Ignoring upload field '{other}'"),
                }
            }
        }
    }
    Ok(form)
}

/// Image bytes from the form, or why there are none.
enum UploadedImage {
    Bytes { name: String, bytes: Vec<u8> },
    /// The client sent something that should have been an image but wasn't decodable.
    Unreadable { name: String, reason: String },
}

fn take_image(form: &mut UploadForm) -> Result<UploadedImage, TutorError> {
    if let Some(bytes) = form.file.take() {
        let name = form.file_name.take().unwrap_or_default();
        imaging::validate_filename(&name)?;
        if bytes.is_empty() {
            return Err(TutorError::missing_image());
        }
        return Ok(UploadedImage::Bytes { name, bytes });
    }

    let Some(data) = non_blank(form.image_data.take()) else {
        return Err(TutorError::missing_image());
    };
    let name = "ảnh chụp".to_string();
    use base64::Engine as _;
    match base64::engine::general_purpose::STANDARD.decode(strip_data_url(&data).trim()) {
        Ok(bytes) if !bytes.is_empty() => Ok(UploadedImage::Bytes { name, bytes }),
        Ok(_) => Err(TutorError::missing_image()),
        Err(e) => Ok(UploadedImage::Unreadable {
            name,
            reason: format!("base64 không hợp lệ: {e}"),
        }),
    }
}

/// Decode, enhance and (optionally) OCR off the async runtime.
async fn process_image(
    bytes: Vec<u8>,
    run_ocr: bool,
) -> Result<(ProcessedImage, Option<Result<String, TutorError>>), TutorError> {
    tokio::task::spawn_blocking(move || {
        let processed = ProcessedImage::from_bytes(&bytes)?;
        let text = run_ocr.then(|| ocr::extract_text(&processed.binary));
        Ok((processed, text))
    })
    .await
    .map_err(|e| TutorError::Other(anyhow::anyhow!("image worker failed: {e}")))?
}

/// POST /upload_image - Process an uploaded image and ask about it.
pub async fn upload_image(
    State(state): State<ApiState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);

    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            return session.attach(error_response(
                StatusCode::BAD_REQUEST,
                format!("Yêu cầu không hợp lệ: {}", rejection.body_text()),
            ));
        }
    };

    let mut form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => return session.attach(tutor_error_response(&e)),
    };

    let uploaded = match take_image(&mut form) {
        Ok(img) => img,
        Err(e) => return session.attach(tutor_error_response(&e)),
    };

    let run_ocr = form.extract_text || form.ocr_only;
    let mut notices: Vec<String> = Vec::new();
    let mut images = None;
    let mut extracted_text = None;

    let (image_name, image_input) = match uploaded {
        UploadedImage::Bytes { name, bytes } => match process_image(bytes, run_ocr).await {
            Ok((processed, ocr_result)) => {
                images = Some(ImageVariants {
                    original: imaging::data_url(IMAGE_MIME_TYPE, &processed.jpeg),
                    enhanced: imaging::data_url("image/png", &processed.enhanced_png),
                });
                match ocr_result {
                    Some(Ok(text)) => extracted_text = Some(text),
                    Some(Err(e)) => {
                        tracing::warn!("Text extraction failed: {e}");
                        notices.push(e.to_string());
                    }
                    None => {}
                }
                (name, ImageInput::Jpeg(processed.jpeg))
            }
            Err(e) => {
                tracing::warn!("Could not process uploaded image '{name}': {e}");
                notices.push(e.to_string());
                let reason = e.to_string();
                (name, ImageInput::Unavailable { reason })
            }
        },
        UploadedImage::Unreadable { name, reason } => {
            notices.push(TutorError::Image(reason.clone()).to_string());
            (name, ImageInput::Unavailable { reason })
        }
    };

    if form.ocr_only {
        let response = match &extracted_text {
            Some(text) => UploadImageResponse {
                response: text.clone(),
                success: true,
                extracted_text: extracted_text.clone(),
                images,
                notice: None,
            },
            None => UploadImageResponse {
                response: notices
                    .first()
                    .cloned()
                    .unwrap_or_else(|| TutorError::OcrUnavailable.to_string()),
                success: false,
                extracted_text: None,
                images,
                notice: None,
            },
        };
        return session.attach(Json(response).into_response());
    }

    let mut message = non_blank(form.message.take()).unwrap_or_else(|| DEFAULT_IMAGE_QUESTION.into());
    if let Some(text) = extracted_text.as_deref().filter(|t| !t.is_empty()) {
        message.push_str("\n\nVăn bản nhận dạng được từ ảnh:\n");
        message.push_str(text);
    }

    let request = PromptRequest {
        message,
        subject: state.subject_or_default(form.subject.take()),
        mode: form.mode.as_deref().map(Mode::parse).unwrap_or(Mode::ProblemSolving),
        solution_mode: form
            .solution_mode
            .as_deref()
            .map(SolutionMode::parse)
            .unwrap_or_default(),
        image_reference: Some(if image_name.is_empty() {
            "ảnh tải lên".to_string()
        } else {
            image_name
        }),
    };

    let session_key = state.sessions.api_key(&session.id);
    let credential = state
        .credentials
        .resolve(form.api_key.as_deref(), session_key.as_deref());

    let exchange = state
        .tutor
        .ask(
            &request,
            credential.as_ref().map(|c| c.key.as_str()),
            Some(image_input),
        )
        .await;

    if let Some(turn) = exchange.turn {
        state.sessions.append(&session.id, turn);
    }

    session.attach(
        Json(UploadImageResponse {
            response: exchange.result.text,
            success: exchange.result.success,
            extracted_text,
            images,
            notice: (!notices.is_empty()).then(|| notices.join(" ")),
        })
        .into_response(),
    )
}

/// POST /clear_history - Empty the caller's conversation.
pub async fn clear_history(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);
    state.sessions.clear_history(&session.id);
    session.attach(
        Json(StatusResponse {
            status: "success".into(),
            message: "Lịch sử đã được xóa".into(),
        })
        .into_response(),
    )
}

/// GET /history - The caller's conversation, oldest first.
pub async fn get_history(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);
    let history = state.sessions.history(&session.id);
    session.attach(Json(HistoryResponse { history }).into_response())
}

fn api_key_status(state: &ApiState, session_id: &str) -> ApiKeyStatus {
    let session_key = state.sessions.api_key(session_id);
    match state.credentials.resolve(None, session_key.as_deref()) {
        Some(resolved) => ApiKeyStatus {
            configured: true,
            source: Some(resolved.origin),
            masked: Some(mask_key(&resolved.key)),
        },
        None => ApiKeyStatus {
            configured: false,
            source: None,
            masked: None,
        },
    }
}

/// GET /api_key - Which credential would be used, masked.
pub async fn get_api_key(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);
    let status = api_key_status(&state, &session.id);
    session.attach(Json(status).into_response())
}

/// POST /api_key - Store (or with a blank value, forget) the session's key.
pub async fn set_api_key(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<ApiKeyRequest>, JsonRejection>,
) -> Response {
    let session = SessionHandle::resolve(&state.sessions, &headers);
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return session.attach(error_response(
                StatusCode::BAD_REQUEST,
                format!("Yêu cầu không hợp lệ: {}", rejection.body_text()),
            ));
        }
    };

    state
        .sessions
        .set_api_key(&session.id, body.api_key.as_deref());
    tracing::info!(
        cleared = body.api_key.as_deref().map_or(true, |k| k.trim().is_empty()),
        "Session API key updated"
    );

    let status = api_key_status(&state, &session.id);
    session.attach(Json(status).into_response())
}

/// GET /subjects - Subjects offered in the subject picker.
pub async fn list_subjects(State(state): State<ApiState>) -> Json<SubjectsResponse> {
    Json(SubjectsResponse {
        subjects: state.tutor_config.subjects.clone(),
        default_subject: state.tutor_config.default_subject.clone(),
    })
}

/// GET /health - Simple health check.
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.tutor.provider_id(),
        "ocr": ocr::is_available(),
    }))
}
