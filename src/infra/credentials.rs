// src/infra/credentials.rs - API key resolution
//
// Precedence, highest first:
//   request override > session key > GEMINI_API_KEY > GOOGLE_API_KEY > config file

use serde::Serialize;

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOrigin {
    Request,
    Session,
    Environment,
    ConfigFile,
}

/// One candidate in the resolution chain.
#[derive(Debug, Clone, Copy)]
pub struct CredentialSource<'a> {
    pub origin: CredentialOrigin,
    pub value: Option<&'a str>,
}

impl<'a> CredentialSource<'a> {
    pub fn new(origin: CredentialOrigin, value: Option<&'a str>) -> Self {
        Self { origin, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub key: String,
    pub origin: CredentialOrigin,
}

/// Return the first non-blank value in `sources`, trimmed.
pub fn resolve_credential(sources: &[CredentialSource<'_>]) -> Option<ResolvedCredential> {
    sources.iter().find_map(|source| {
        let key = source.value?.trim();
        if key.is_empty() {
            None
        } else {
            Some(ResolvedCredential {
                key: key.to_string(),
                origin: source.origin,
            })
        }
    })
}

/// Process-level fallbacks, snapshotted once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    pub environment: Option<String>,
    pub config_file: Option<String>,
}

impl StaticCredentials {
    pub fn from_env(config_key: Option<String>) -> Self {
        let environment = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty());
        Self {
            environment,
            config_file: config_key,
        }
    }

    /// Resolve with the per-request and per-session candidates in front.
    pub fn resolve(
        &self,
        request: Option<&str>,
        session: Option<&str>,
    ) -> Option<ResolvedCredential> {
        resolve_credential(&[
            CredentialSource::new(CredentialOrigin::Request, request),
            CredentialSource::new(CredentialOrigin::Session, session),
            CredentialSource::new(CredentialOrigin::Environment, self.environment.as_deref()),
            CredentialSource::new(CredentialOrigin::ConfigFile, self.config_file.as_deref()),
        ])
    }
}

/// Show only enough of a key to recognise it: `AIza…9xQk`.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
