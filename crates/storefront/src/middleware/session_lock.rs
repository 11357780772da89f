//! Per-session serialization of state-changing requests.
//!
//! The session layer loads the record lazily inside the handler and saves the
//! whole record after the handler returns. Two overlapping writes for the same
//! session would each save their own copy of the cart, and the last save wins.
//! This middleware wraps the session layer and holds a lock keyed by the
//! session cookie from before the load until after the save.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;

use super::session::{SESSION_COOKIE_NAME, SESSION_EXPIRY_SECONDS};

/// Lock table keyed by session cookie value.
///
/// Entries idle for longer than a session lives are dropped.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        let idle = Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs());
        Self {
            locks: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// The lock shared by every request carrying `session_key`.
    pub async fn lock_for(&self, session_key: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session_key.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Run state-changing requests of one session one at a time.
///
/// Safe methods and requests without a session cookie pass straight through;
/// a request without a cookie always starts a fresh session.
pub async fn session_lock_middleware(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    if request.method().is_safe() {
        return next.run(request).await;
    }
    let Some(session_key) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(&session_key).await;
    let _guard = lock.lock().await;
    next.run(request).await
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_cookie_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; cardapio_session=abc123; b=2"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_cookie_missing() {
        let mut headers = HeaderMap::new();
        assert!(session_cookie(&headers).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("other=1"));
        assert!(session_cookie(&headers).is_none());
    }

    #[tokio::test]
    async fn test_same_key_shares_lock() {
        let locks = SessionLocks::new();
        let first = locks.lock_for("abc").await;
        let again = locks.lock_for("abc").await;
        let other = locks.lock_for("xyz").await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));

        let _guard = first.lock().await;
        assert!(again.try_lock().is_err());
        assert!(other.try_lock().is_ok());
    }
}
