// src/cli/status.rs - Configuration and credential status

use std::fmt::Write as _;
use std::path::Path;

use crate::imaging::ocr;
use crate::infra::config::{Config, ProviderKind};
use crate::infra::credentials::{mask_key, StaticCredentials};

/// Display where config comes from and which credential would be used.
/// `config_path` is the file `config` was loaded from (`--config` or the default location).
pub fn show_status(
    config_path: &Path,
    config: &Config,
    credentials: &StaticCredentials,
) -> anyhow::Result<()> {
    print!("{}", render_status(config_path, config, credentials)?);
    Ok(())
}

fn render_status(
    config_path: &Path,
    config: &Config,
    credentials: &StaticCredentials,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "hoctap v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;

    if config_path.exists() {
        writeln!(out, "  Config:     {} (loaded)", config_path.display())?;
    } else {
        writeln!(out, "  Config:     (using defaults)")?;
    }

    writeln!(
        out,
        "  Server:     http://{}:{} (uploads up to {} MB)",
        config.server.host, config.server.port, config.server.max_upload_mb
    )?;
    writeln!(
        out,
        "  Sessions:   up to {}, dropped after {} min idle",
        config.server.max_sessions, config.server.session_idle_minutes
    )?;

    match config.provider.kind {
        ProviderKind::Gemini => writeln!(
            out,
            "  Provider:   gemini / {} (timeout {}s)",
            config.provider.model, config.provider.timeout_seconds
        )?,
        ProviderKind::Offline => writeln!(out, "  Provider:   offline (canned answers)")?,
    }

    match credentials.resolve(None, None) {
        Some(resolved) => writeln!(
            out,
            "  API key:    {} (from {:?})",
            mask_key(&resolved.key),
            resolved.origin
        )?,
        None => writeln!(out, "  API key:    (not set; clients must send one)")?,
    }

    let ocr_state = if ocr::is_available() {
        format!("tesseract ({})", ocr::OCR_LANGUAGES)
    } else {
        "disabled (build with --features ocr)".to_string()
    };
    writeln!(out, "  OCR:        {ocr_state}")?;
    writeln!(out, "  Subjects:   {}", config.tutor.subjects.join(", "))?;
    Ok(out)
}
