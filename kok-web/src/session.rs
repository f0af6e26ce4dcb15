//! Cookie sessions and the login guard.
//!
//! A successful login stores a random token in an `HttpOnly` cookie and maps
//! it to the username in an in-process store. Sessions end on logout, after
//! [`SESSION_TTL`], or when the server restarts.

use crate::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "kok_session";

/// Lifetime of a session counted from login.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// A logged-in user, available to guarded handlers as `Extension<Session>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
}

struct Entry {
    session: Session,
    issued: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.issued.elapsed() < self.ttl
    }

    /// Start a session and return its token. Expired sessions are dropped.
    pub fn create(&self, username: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        sessions.retain(|_, entry| self.is_live(entry));
        sessions.insert(
            token.clone(),
            Entry {
                session: Session {
                    username: username.to_string(),
                },
                issued: Instant::now(),
            },
        );
        token
    }

    /// Session for `token`, unless it has expired.
    pub fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.lock();
        let live = self.is_live(sessions.get(token)?);
        if live {
            sessions.get(token).map(|entry| entry.session.clone())
        } else {
            sessions.remove(token);
            None
        }
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        self.lock().remove(token).map(|entry| entry.session)
    }

    /// Number of sessions currently held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session token carried by the request's `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn safe_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Middleware guarding routes that need a logged-in user.
///
/// Anonymous requests are redirected to `/login?next=<path>`.
pub async fn require_login(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = session_token(req.headers()).and_then(|token| state.sessions.get(&token));
    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => {
            let target = format!("/login?next={}", req.uri().path());
            log::debug!("anonymous request to {}, redirecting", req.uri().path());
            Redirect::to(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn store_round_trip() {
        let store = SessionStore::new();
        let token = store.create("admin");
        assert_eq!(store.get(&token).unwrap().username, "admin");
        assert!(store.remove(&token).is_some());
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn expired_session_is_dropped() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let token = store.create("admin");
        assert_eq!(store.len(), 1);
        assert!(store.get(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn login_purges_expired_sessions() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        store.create("a");
        store.create("b");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tokens_are_unique() {
        let store = SessionStore::new();
        assert_ne!(store.create("a"), store.create("a"));
    }

    #[test]
    fn token_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; kok_session=abc-123; lang=th"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_cookie_means_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn redirect_targets_stay_local() {
        assert_eq!(safe_redirect_target(Some("/edit-station/KK01")), "/edit-station/KK01");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }
}
