use std::net::SocketAddr;
use std::sync::Arc;

use agrosense::api::{build_app, AppState};
use agrosense::crypto::Argon2Hasher;
use agrosense::session::{FileSessionStore, InMemorySessionStore, SessionManager, SessionStore};
use agrosense::{AppConfig, InMemoryUserRepository};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let store: Arc<dyn SessionStore> = match &config.session_dir {
        Some(dir) => {
            log::info!(target: "agrosense::session", "msg=\"using file session store\" dir=\"{}\"", dir.display());
            Arc::new(FileSessionStore::new(dir).context("failed to open session directory")?)
        }
        None => {
            log::info!(target: "agrosense::session", "msg=\"using in-memory session store\"");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let sessions = SessionManager::try_new(store, config.session.clone())?;
    let state = AppState::new(InMemoryUserRepository::new()).with_hasher(Argon2Hasher::production());
    let app = build_app(state, sessions, config.gate.clone(), Some(config.static_dir.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!(target: "agrosense::api", "msg=\"listening\" addr=\"{}\"", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
