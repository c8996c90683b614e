//! The request-scoped session accessor handed to handlers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use cookie::Cookie;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::cookie::{
    build_removal_cookie, build_session_cookie, sign_session_id, verify_signed_cookie,
};
use super::handle::SessionHandle;
use super::store::SessionStore;
use super::{SessionConfig, SessionError};

/// What the response must do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    /// Sign this identifier and (re)issue the cookie.
    Set(String),
    /// Overwrite the cookie with an empty, already-expired value.
    Clear,
}

/// The current request's session.
///
/// Built once per request by [`manage_session`](super::manage_session) and
/// shared through request extensions; clones refer to the same request
/// state. The identifier is resolved lazily on first use and then cached for
/// the rest of the request, so the store is touched by resolution at most once
/// and only one cookie action is ever pending.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    config: Arc<SessionConfig>,
    cookie_value: Option<String>,
    secure: bool,
    state: Mutex<RequestState>,
}

#[derive(Default)]
struct RequestState {
    handle: Option<SessionHandle>,
    /// Set by `clear`; the presented cookie is ignored from then on.
    cleared: bool,
    pending: Option<CookieAction>,
}

impl Session {
    /// Creates the session view for one request.
    ///
    /// `cookie_value` is the raw (still signed) `idsession` value, if the
    /// browser sent one. `secure` decides the `Secure` attribute of any cookie
    /// this request issues.
    pub fn new(
        store: Arc<dyn SessionStore>,
        config: Arc<SessionConfig>,
        cookie_value: Option<String>,
        secure: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                cookie_value,
                secure,
                state: Mutex::new(RequestState::default()),
            }),
        }
    }

    /// Returns the request's handle, resolving it on first use.
    pub async fn handle(&self) -> Result<SessionHandle, SessionError> {
        let mut state = self.inner.state.lock().await;

        if let Some(handle) = &state.handle {
            return Ok(handle.clone());
        }

        let cookie_value = if state.cleared {
            None
        } else {
            self.inner.cookie_value.as_deref()
        };
        let handle = SessionHandle::resolve(
            Arc::clone(&self.inner.store),
            &self.inner.config.secret_key,
            None,
            cookie_value,
        )
        .await?;

        state.pending = Some(CookieAction::Set(handle.id().to_owned()));
        state.handle = Some(handle.clone());
        Ok(handle)
    }

    /// The resolved session identifier.
    pub async fn id(&self) -> Result<String, SessionError> {
        Ok(self.handle().await?.id().to_owned())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        self.handle().await?.get(key).await
    }

    /// Stores `value` under `key`. Values serializing to `null` are ignored.
    pub async fn set<V: Serialize>(&self, key: &str, value: V) -> Result<(), SessionError> {
        let value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.handle().await?.set(key, value).await
    }

    pub async fn contains(&self, key: &str) -> Result<bool, SessionError> {
        self.handle().await?.contains(key).await
    }

    pub async fn snapshot(&self) -> Result<Map<String, Value>, SessionError> {
        self.handle().await?.snapshot().await
    }

    /// Ends the session presented by the browser.
    ///
    /// Without a session cookie this does nothing. Otherwise the record behind
    /// a verifiable cookie is deleted and the response is told to expire the
    /// cookie. Any later access in the same request starts a new session.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let Some(cookie_value) = self.inner.cookie_value.as_deref() else {
            return Ok(());
        };

        let mut state = self.inner.state.lock().await;

        if let Ok(session_id) = verify_signed_cookie(cookie_value, &self.inner.config.secret_key) {
            self.inner.store.delete(&session_id).await?;
            log::info!(target: "agrosense::session", "msg=\"session cleared\"");
        }

        state.handle = None;
        state.cleared = true;
        state.pending = Some(CookieAction::Clear);
        Ok(())
    }

    /// Takes the pending cookie action. Returns `Some` at most once.
    pub async fn take_cookie_action(&self) -> Option<CookieAction> {
        self.inner.state.lock().await.pending.take()
    }

    /// Renders a cookie action as the `Set-Cookie` to send.
    pub fn render_cookie(&self, action: &CookieAction) -> Cookie<'static> {
        let config = &self.inner.config;
        match action {
            CookieAction::Set(session_id) => build_session_cookie(
                sign_session_id(session_id, &config.secret_key),
                self.inner.secure,
                config,
            ),
            CookieAction::Clear => build_removal_cookie(self.inner.secure, config),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            log::error!(
                target: "agrosense::session",
                "msg=\"session extension missing\" hint=\"install manage_session\""
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "session middleware is not installed",
            )
        })
    }
}
