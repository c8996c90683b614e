//! HTTP surface: routes, the login gate and the JSON envelope.

mod error;
pub mod gate;
mod handlers;
mod routes;
mod types;
mod views;

pub use error::ApiError;
pub use gate::{require_login, GateConfig, GateDecision};
pub use routes::{app_routes, build_app, AppState};
pub use types::{Envelope, LoginRequest, RegisterRequest, SecurityCheckRequest};
pub use views::render;
