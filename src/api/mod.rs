// src/api/mod.rs - HTTP surface for the tutor (browser client + JSON API)

pub mod handlers;
pub mod session;
pub mod types;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::tutor::Tutor;
use crate::infra::config::{ServerConfig, TutorConfig};
use crate::infra::credentials::StaticCredentials;
use crate::infra::session::SessionStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub tutor: Tutor,
    pub sessions: SessionStore,
    /// Environment and config-file keys, captured once at startup.
    pub credentials: Arc<StaticCredentials>,
    pub tutor_config: Arc<TutorConfig>,
}

impl ApiState {
    pub fn new(tutor: Tutor, credentials: StaticCredentials, tutor_config: TutorConfig) -> Self {
        Self {
            tutor,
            sessions: SessionStore::new(),
            credentials: Arc::new(credentials),
            tutor_config: Arc::new(tutor_config),
        }
    }

    /// Replace the default session store (e.g. one built from `[server]` limits).
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Trimmed subject from the request, or the configured default.
    pub fn subject_or_default(&self, subject: Option<String>) -> String {
        subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.tutor_config.default_subject.clone())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/send_message", post(handlers::send_message))
        .route("/upload_image", post(handlers::upload_image))
        .route("/clear_history", post(handlers::clear_history))
        .route("/history", get(handlers::get_history))
        .route("/api_key", get(handlers::get_api_key).post(handlers::set_api_key))
        .route("/subjects", get(handlers::list_subjects))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes()))
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn start_server(server: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let router = build_router(state, server);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Tutor listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::PromptComposer;
    use crate::provider::offline::OfflineProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let tutor = Tutor::new(PromptComposer::default(), Arc::new(OfflineProvider::new()));
        ApiState::new(tutor, StaticCredentials::default(), TutorConfig::default())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state(), &ServerConfig::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cookieless_requests_respect_session_cap() {
        let limits = crate::infra::session::SessionLimits {
            max_sessions: 3,
            ..Default::default()
        };
        let state = test_state().with_sessions(SessionStore::with_limits(limits));
        let app = build_router(state.clone(), &ServerConfig::default());
        for _ in 0..10 {
            let req = Request::builder()
                .uri("/history")
                .body(Body::empty())
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(state.sessions.len(), 3);
    }

    #[test]
    fn test_subject_or_default() {
        let state = test_state();
        assert_eq!(state.subject_or_default(None), "Tổng hợp");
        assert_eq!(state.subject_or_default(Some("  ".into())), "Tổng hợp");
        assert_eq!(state.subject_or_default(Some(" Vật lý ".into())), "Vật lý");
    }

    #[test]
    fn test_cors_layer_skips_bad_origins() {
        // Must not panic on a header-invalid origin.
        let _ = cors_layer(&["http://localhost:5000".into(), "bad\norigin".into()]);
    }
}
