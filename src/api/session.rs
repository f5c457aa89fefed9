// src/api/session.rs - Session cookie handling

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;

use crate::infra::session::SessionStore;

pub const SESSION_COOKIE: &str = "hoctap_session";

/// The caller's session for the duration of one request.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    created: bool,
}

impl SessionHandle {
    /// Look up the session named by the request cookie, creating one if the
    /// cookie is missing or names a session we don't know.
    pub fn resolve(store: &SessionStore, headers: &HeaderMap) -> Self {
        let existing = cookie_value(headers, SESSION_COOKIE);
        let (id, created) = store.ensure(existing.as_deref());
        Self { id, created }
    }

    /// Add `Set-Cookie` to the response when this request started a session.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.created {
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; hoctap_session=abc-123; lang=vi"),
        );
        assert_eq!(cookie_value(&headers, SESSION_COOKIE).as_deref(), Some("abc-123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_new_session_sets_cookie_once() {
        let store = SessionStore::new();
        let handle = SessionHandle::resolve(&store, &HeaderMap::new());
        let response = handle.attach("ok".into_response());
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}={}", handle.id)));
        assert!(set_cookie.contains("HttpOnly"));

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={}", handle.id)).unwrap(),
        );
        let again = SessionHandle::resolve(&store, &headers);
        assert_eq!(again.id, handle.id);
        let response = again.attach("ok".into_response());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
