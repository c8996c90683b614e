//! Session middleware for axum.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{HOST, SET_COOKIE};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use super::context::Session;
use super::cookie::read_cookie;
use super::store::SessionStore;
use super::{SessionConfig, SessionError};

/// Shared session machinery: the store and the cookie contract.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use agrosense::session::{manage_session, InMemorySessionStore, SessionConfig, SessionManager};
///
/// let sessions = SessionManager::new(Arc::new(InMemorySessionStore::new()), config);
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(sessions, manage_session));
/// ```
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Like [`new`](Self::new), but rejects an unusable cookie configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] when [`SessionConfig::validate`] fails.
    pub fn try_new(
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|e| SessionError::Configuration(e.to_owned()))?;
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Builds the [`Session`] view of an incoming request.
    pub fn session_for(&self, request: &Request) -> Session {
        let cookie_value = read_cookie(request.headers(), &self.config.cookie_name);
        let host = request
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| request.uri().host())
            .unwrap_or_default();

        Session::new(
            Arc::clone(&self.store),
            Arc::clone(&self.config),
            cookie_value,
            self.config.is_secure_host(host),
        )
    }
}

/// Installs a request-scoped [`Session`] and writes its cookie on the response.
///
/// The cookie is written after the inner service returns, whatever its
/// status, and at most once per request.
pub async fn manage_session(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = manager.session_for(&request);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(action) = session.take_cookie_action().await {
        let cookie = session.render_cookie(&action);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                log::error!(
                    target: "agrosense::session",
                    "msg=\"session cookie not representable as header\" error=\"{e}\""
                );
            }
        }
    }

    response
}
