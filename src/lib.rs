//! Server-side sessions with signed-cookie identity for the agrosense
//! field advisory app.
//!
//! A browser carries one signed identifier in the `idsession` cookie. The
//! identifier names a session record in a [`SessionStore`](session::SessionStore);
//! handlers read and write that record through the request-scoped
//! [`Session`] extractor, and [`api::gate::require_login`] keeps anonymous
//! visitors out of everything but the public pages.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agrosense::api::{build_app, AppState, GateConfig};
//! use agrosense::session::{InMemorySessionStore, SessionConfig, SessionManager};
//! use agrosense::InMemoryUserRepository;
//!
//! let sessions = SessionManager::new(Arc::new(InMemorySessionStore::new()), session_config);
//! let state = AppState::new(InMemoryUserRepository::new());
//! let app = build_app(state, sessions, GateConfig::default(), None);
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod crypto;
pub mod repository;
mod secret;
pub mod session;
pub mod validators;

pub use actions::{LoginAction, RegisterAction};
pub use config::AppConfig;
pub use repository::{InMemoryUserRepository, User, UserRepository, UserStatus};
pub use secret::SecretString;
pub use session::{Session, SessionError};
pub use validators::ValidationError;

/// Errors raised by the application layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Failed to hash password")]
    PasswordHashError,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
