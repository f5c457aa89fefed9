// src/infra/config.rs - Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::infra::paths;
use crate::infra::session::SessionLimits;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub tutor: TutorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for `/upload_image` bodies.
    pub max_upload_mb: usize,
    pub cors_origins: Vec<String>,
    /// Sessions idle this long are dropped with their history.
    pub session_idle_minutes: u64,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            max_upload_mb: 16,
            cors_origins: vec![
                "http://localhost:5000".into(),
                "http://127.0.0.1:5000".into(),
            ],
            session_idle_minutes: 180,
            max_sessions: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            idle_timeout: Duration::from_secs(self.session_idle_minutes.saturating_mul(60)),
            max_sessions: self.max_sessions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    /// Canned answers, no network. Useful for demos and local UI work.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Lowest-precedence credential; env vars and session keys win over it.
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-1.5-flash".into(),
            timeout_seconds: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub subjects: Vec<String>,
    pub default_subject: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            subjects: [
                "Toán học",
                "Ngữ văn",
                "Tiếng Anh",
                "Vật lý",
                "Hóa học",
                "Sinh học",
                "Lịch sử",
                "Địa lý",
                "Công nghệ",
                "Giáo dục công dân",
                "Tin học",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            default_subject: "Tổng hợp".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.server.port, 5000);
        assert_eq!(c.server.max_upload_bytes(), 16 * 1024 * 1024);
        assert_eq!(c.provider.kind, ProviderKind::Gemini);
        assert_eq!(c.provider.timeout_seconds, 60);
        assert!(c.provider.api_key.is_none());
        assert_eq!(c.tutor.subjects.len(), 11);
        assert_eq!(c.tutor.default_subject, "Tổng hợp");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.provider.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080
max_upload_mb = 4
cors_origins = ["https://hoc.example.vn"]

[provider]
kind = "offline"
base_url = "http://localhost:9999"
model = "gemini-2.0-flash"
timeout_seconds = 15
api_key = "from-config"

[tutor]
subjects = ["Toán học", "Tin học"]
default_subject = "Toán học"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["https://hoc.example.vn"]);
        assert_eq!(config.provider.kind, ProviderKind::Offline);
        assert_eq!(config.provider.timeout_seconds, 15);
        assert_eq!(config.provider.api_key.as_deref(), Some("from-config"));
        assert_eq!(config.tutor.subjects.len(), 2);
        assert_eq!(config.tutor.default_subject, "Toán học");
    }

    #[test]
    fn test_unknown_provider_kind_rejected() {
        let toml_str = "[provider]\nkind = \"openai\"";
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_partial_provider_section() {
        let config: Config = toml::from_str("[provider]\napi_key = \"AIza-x\"").unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("AIza-x"));
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.provider.timeout_seconds, 60);
    }

    #[test]
    fn test_partial_server_and_tutor_sections() {
        let toml_str = "[server]\nport = 8080\n\n[tutor]\ndefault_subject = \"Toán học\"";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.max_upload_mb, 16);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.tutor.default_subject, "Toán học");
        assert_eq!(config.tutor.subjects.len(), 11);
    }

    #[test]
    fn test_session_limits_from_server_section() {
        let toml_str = "[server]\nsession_idle_minutes = 30\nmax_sessions = 200";
        let config: Config = toml::from_str(toml_str).unwrap();
        let limits = config.server.session_limits();
        assert_eq!(limits.idle_timeout, Duration::from_secs(30 * 60));
        assert_eq!(limits.max_sessions, 200);
        assert_eq!(
            Config::default().server.session_limits().idle_timeout,
            Duration::from_secs(180 * 60)
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from(&dir.path().join("nope.toml")).is_err());
    }
}
