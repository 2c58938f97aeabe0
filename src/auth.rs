use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::{
    error::AppError,
    models::session::Session,
    services::backend::AuthBackend,
    state::AppState,
};

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Where the guard sends callers that are not signed in.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Remembers the last navigation so an HTTP handler can turn it into a
/// redirect response.
#[derive(Debug, Default)]
pub struct PendingRedirect(Mutex<Option<String>>);

impl PendingRedirect {
    pub fn take(&self) -> Option<String> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Navigator for PendingRedirect {
    fn navigate(&self, path: &str) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(path.to_string());
        }
    }
}

pub struct SessionGuard {
    auth: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    redirect_path: String,
}

impl SessionGuard {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        navigator: Arc<dyn Navigator>,
        redirect_path: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            navigator,
            redirect_path: redirect_path.into(),
        }
    }

    pub fn redirect_path(&self) -> &str {
        &self.redirect_path
    }

    /// One session lookup, no retry. A backend error counts as signed out;
    /// either way the navigator is sent to the redirect path exactly once.
    pub async fn authorize(&self) -> Option<Session> {
        match self.auth.get_session().await {
            Ok(Some(session)) => return Some(session),
            Ok(None) => debug!(redirect = %self.redirect_path, "no active session"),
            Err(err) => {
                warn!(error = %err, redirect = %self.redirect_path, "session lookup failed")
            }
        }
        self.navigator.navigate(&self.redirect_path);
        None
    }

    pub async fn check_access(&self) -> bool {
        self.authorize().await.is_some()
    }
}

/// Bearer header first, then the session cookie.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for routes that need a signed-in passenger. Rejects with a
/// redirect to the configured auth path.
#[derive(Debug, Clone)]
pub struct AuthenticatedPassenger(pub Session);

impl AuthenticatedPassenger {
    pub fn passenger_id(&self) -> &str {
        &self.0.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedPassenger {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let pending = Arc::new(PendingRedirect::default());
        let guard = SessionGuard::new(
            state.auth.connect(access_token(&parts.headers)),
            pending.clone(),
            state.config.auth_redirect_path.clone(),
        );

        match guard.authorize().await {
            Some(session) => Ok(Self(session)),
            None => Err(AppError::Redirect(
                pending
                    .take()
                    .unwrap_or_else(|| guard.redirect_path().to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::{error::BackendError, models::session::SessionUser};

    enum Outcome {
        Session,
        Anonymous,
        Failure,
    }

    struct StubAuth(Outcome);

    #[async_trait]
    impl AuthBackend for StubAuth {
        async fn get_session(&self) -> Result<Option<Session>, BackendError> {
            match self.0 {
                Outcome::Session => Ok(Some(Session {
                    access_token: "token".into(),
                    user: SessionUser {
                        id: "user-1".into(),
                        email: None,
                    },
                })),
                Outcome::Anonymous => Ok(None),
                Outcome::Failure => Err(BackendError::BackendUnavailable("timeout".into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNavigator(Mutex<Vec<String>>);

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.0.lock().unwrap().push(path.to_string());
        }
    }

    async fn run(outcome: Outcome) -> (bool, Vec<String>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let guard = SessionGuard::new(Arc::new(StubAuth(outcome)), navigator.clone(), "/auth");
        let allowed = guard.check_access().await;
        let visits = navigator.0.lock().unwrap().clone();
        (allowed, visits)
    }

    #[tokio::test]
    async fn session_grants_access_without_navigation() {
        let (allowed, visits) = run(Outcome::Session).await;
        assert!(allowed);
        assert!(visits.is_empty());
    }

    #[tokio::test]
    async fn missing_session_redirects_once() {
        let (allowed, visits) = run(Outcome::Anonymous).await;
        assert!(!allowed);
        assert_eq!(visits, vec!["/auth".to_string()]);
    }

    #[tokio::test]
    async fn backend_error_is_treated_as_signed_out() {
        let (allowed, visits) = run(Outcome::Failure).await;
        assert!(!allowed);
        assert_eq!(visits, vec!["/auth".to_string()]);
    }

    #[test]
    fn prefers_bearer_header_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            "cookie",
            HeaderValue::from_static("sb-access-token=from-cookie"),
        );
        assert_eq!(access_token(&headers).as_deref(), Some("abc"));

        headers.remove(AUTHORIZATION);
        assert_eq!(access_token(&headers).as_deref(), Some("from-cookie"));

        assert_eq!(access_token(&HeaderMap::new()), None);
    }

    #[test]
    fn pending_redirect_is_taken_once() {
        let pending = PendingRedirect::default();
        pending.navigate("/login");
        assert_eq!(pending.take().as_deref(), Some("/login"));
        assert_eq!(pending.take(), None);
    }
}
