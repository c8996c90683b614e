use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::gate::{require_login, GateConfig};
use super::handlers;
use crate::crypto::Argon2Hasher;
use crate::session::{manage_session, SessionManager};
use crate::UserRepository;

#[derive(Clone)]
pub struct AppState<U> {
    pub user_repo: U,
    pub hasher: Argon2Hasher,
}

impl<U> AppState<U> {
    pub fn new(user_repo: U) -> Self {
        Self {
            user_repo,
            hasher: Argon2Hasher::default(),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Argon2Hasher) -> Self {
        self.hasher = hasher;
        self
    }
}

/// All page and script routes, without middleware.
pub fn app_routes<U>() -> Router<AppState<U>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/Login",
            get(handlers::login_page).post(handlers::login::<U>),
        )
        .route(
            "/Register",
            get(handlers::register_page).post(handlers::register::<U>),
        )
        .route(
            "/Logout",
            get(handlers::logout_page).post(handlers::logout),
        )
        .route("/SecurityCheck", post(handlers::security_check))
        .route("/VariablesDeInicio", get(handlers::initial_variables))
        .route("/DatosDeCampo", get(handlers::field_data))
        .route("/Principal", get(handlers::principal))
        .route("/UploadData", post(handlers::upload_data))
}

/// Assembles the full application.
///
/// Layers, outermost first: request tracing, the session middleware, then the
/// login gate. Unrouted paths fall through to a 404 that is gated too.
pub fn build_app<U>(
    state: AppState<U>,
    sessions: SessionManager,
    gate: GateConfig,
    static_dir: Option<PathBuf>,
) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
{
    let mut router = app_routes::<U>();
    if let Some(dir) = static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(gate),
            require_login,
        ))
        .layer(axum::middleware::from_fn_with_state(sessions, manage_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
