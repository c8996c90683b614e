//! Process configuration.
//!
//! Everything is read from the environment once at startup (after
//! `dotenvy` has loaded any `.env` file).
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `SECRET_KEY` | required | HMAC key for session cookies, at least 32 bytes |
//! | `BIND_ADDR` | `127.0.0.1:7100` | Listen address |
//! | `STATIC_DIR` | `static` | Directory served under `/static` |
//! | `SESSION_DIR` | unset | When set, sessions are kept as JSON files here |
//!
//! # Example
//!
//! ```rust,ignore
//! use agrosense::config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::api::GateConfig;
use crate::session::SessionConfig;
use crate::{AppError, SecretString};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7100";
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    /// `None` keeps sessions in memory.
    pub session_dir: Option<PathBuf>,
    pub session: SessionConfig,
    pub gate: GateConfig,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigurationError` when `SECRET_KEY` is missing or
    /// too short, or `BIND_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::ConfigurationError("SECRET_KEY is not set".to_owned()))?;

        let session = SessionConfig {
            secret_key: SecretString::new(secret_key),
            ..Default::default()
        };
        session
            .validate()
            .map_err(|e| AppError::ConfigurationError(e.to_owned()))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::ConfigurationError(format!("BIND_ADDR is invalid: {e}")))?;

        let static_dir = lookup("STATIC_DIR")
            .filter(|s| !s.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        let session_dir = lookup("SESSION_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            static_dir,
            session_dir,
            session,
            gate: GateConfig::default(),
        })
    }
}
