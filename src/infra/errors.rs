// src/infra/errors.rs - Error types for hoctap
//
// `Display` on every variant is the Vietnamese message shown to the student,
// so handlers can forward `err.to_string()` without another lookup.

use thiserror::Error;

/// Broad category of a failure, used for logging and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected credential.
    Configuration,
    /// Network-level failure talking to the provider.
    Transport,
    /// Provider answered, but not with anything usable.
    Protocol,
    /// Bad input from the client.
    Validation,
    Internal,
}

#[derive(Error, Debug)]
pub enum TutorError {
    // Credential errors
    #[error("Chưa cấu hình khóa API. Vui lòng nhập khóa API Gemini trong phần cài đặt hoặc đặt biến môi trường GEMINI_API_KEY.")]
    MissingCredential,

    #[error("Khóa API không hợp lệ hoặc đã hết hạn. Vui lòng kiểm tra lại khóa API của bạn.")]
    InvalidCredential { detail: Option<String> },

    #[error("Khóa API không có quyền truy cập mô hình này. Vui lòng kiểm tra quyền của khóa API.")]
    PermissionDenied { detail: Option<String> },

    // Provider errors
    #[error("Không thể kết nối đến API (mã lỗi {status}){}", detail_suffix(.detail))]
    Upstream { status: u16, detail: Option<String> },

    #[error("Không thể kết nối đến máy chủ AI. Vui lòng kiểm tra kết nối mạng và thử lại sau.")]
    Transport { message: String },

    #[error("Phản hồi từ API có định dạng không mong đợi. Vui lòng thử lại sau.")]
    UnexpectedResponse { message: String },

    // Client errors
    #[error("{0}")]
    Validation(String),

    #[error("Không thể đọc hình ảnh: {0}")]
    Image(String),

    #[error("Chức năng nhận dạng chữ trong ảnh chưa được bật trên máy chủ.")]
    OcrUnavailable,

    // Infra
    #[error("Lỗi cấu hình: {0}")]
    Config(String),

    #[error("Lỗi vào/ra: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.trim().is_empty() => format!(": {}", d.trim()),
        _ => String::new(),
    }
}

impl TutorError {
    pub fn empty_message() -> Self {
        Self::Validation("Tin nhắn không được để trống".into())
    }

    pub fn unsupported_file() -> Self {
        Self::Validation(
            "Định dạng tệp không được hỗ trợ. Vui lòng tải lên ảnh PNG, JPG, JPEG, GIF, BMP hoặc WEBP."
                .into(),
        )
    }

    pub fn missing_image() -> Self {
        Self::Validation("Không tìm thấy hình ảnh trong yêu cầu".into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential { .. }
            | Self::PermissionDenied { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Upstream { .. } | Self::UnexpectedResponse { .. } => ErrorKind::Protocol,
            Self::Validation(_) | Self::Image(_) => ErrorKind::Validation,
            Self::OcrUnavailable | Self::Io(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status used when this error is surfaced directly at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_carries_detail() {
        let err = TutorError::Upstream {
            status: 503,
            detail: Some("The model is overloaded.".into()),
        };
        assert_eq!(
            err.to_string(),
            "Không thể kết nối đến API (mã lỗi 503): The model is overloaded."
        );
    }

    #[test]
    fn test_upstream_message_without_detail() {
        let err = TutorError::Upstream {
            status: 500,
            detail: None,
        };
        assert_eq!(err.to_string(), "Không thể kết nối đến API (mã lỗi 500)");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(TutorError::MissingCredential.kind(), ErrorKind::Configuration);
        assert_eq!(
            TutorError::Transport {
                message: "dns".into()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            TutorError::UnexpectedResponse {
                message: "no candidates".into()
            }
            .kind(),
            ErrorKind::Protocol
        );
        assert_eq!(TutorError::empty_message().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TutorError::unsupported_file().status_code(), 400);
        assert_eq!(TutorError::MissingCredential.status_code(), 500);
    }

    #[test]
    fn test_transport_message_hides_cause() {
        let err = TutorError::Transport {
            message: "connection reset by peer".into(),
        };
        assert!(!err.to_string().contains("connection reset"));
    }
}
