//! Login gate run before every routed request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::Value;

use super::error::ApiError;
use super::types::Envelope;
use crate::session::Session;
use crate::SessionError;

/// Which paths are public and where anonymous visitors are sent.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Paths starting with any of these prefixes skip the gate.
    pub public_prefixes: Vec<String>,
    pub login_path: String,
    /// Session key whose presence marks a logged-in user.
    pub principal_key: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_prefixes: [
                "/static",
                "/Login",
                "/Register",
                "/AdminLogin",
                "/test",
                "/favicon.ico",
                "/SecurityCheck",
                "/.well-known/appspecific/com.chrome.devtools.json",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            login_path: "/Login".to_owned(),
            principal_key: "iduser".to_owned(),
        }
    }
}

impl GateConfig {
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Answer a script call with a "Login required" envelope.
    DenyJson,
    /// Send a page load to the login form.
    DenyRedirect,
}

/// Truthiness of a stored session value: `null`, `false`, zero, and empty
/// strings, arrays or objects count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Best-effort client address for log lines.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_owned();
    }

    if let Some(real_ip) = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return real_ip.to_owned();
    }

    peer.map_or_else(|| "unknown".to_owned(), |addr| addr.ip().to_string())
}

/// Decides whether a request may reach its handler.
///
/// Script calls (`POST`) only need the principal key to exist; page loads
/// (`GET`) need it to hold a truthy value. Other methods pass.
pub async fn evaluate(
    config: &GateConfig,
    method: &Method,
    path: &str,
    session: &Session,
) -> Result<GateDecision, SessionError> {
    if config.is_public(path) {
        return Ok(GateDecision::Allow);
    }

    if method == Method::POST && !session.contains(&config.principal_key).await? {
        return Ok(GateDecision::DenyJson);
    }

    if method == Method::GET
        && !session
            .get(&config.principal_key)
            .await?
            .is_some_and(|v| is_truthy(&v))
    {
        return Ok(GateDecision::DenyRedirect);
    }

    Ok(GateDecision::Allow)
}

/// Middleware form of [`evaluate`]. Install inside the session middleware.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/Principal", get(principal))
///     .layer(axum::middleware::from_fn_with_state(Arc::new(GateConfig::default()), require_login))
///     .layer(axum::middleware::from_fn_with_state(sessions, manage_session));
/// ```
pub async fn require_login(
    State(config): State<Arc<GateConfig>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    let decision = match evaluate(&config, request.method(), &path, &session).await {
        Ok(decision) => decision,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if decision == GateDecision::Allow {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);
    log::warn!(target: "agrosense::gate", "{ip} tried to access {path} without logging in");

    match decision {
        GateDecision::DenyJson => Envelope::error("Login required")
            .redirect(&config.login_path)
            .into_response(),
        _ => Redirect::to(&config.login_path).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::{InMemorySessionStore, SessionConfig};
    use crate::SecretString;

    fn session() -> Session {
        Session::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(SessionConfig {
                secret_key: SecretString::new("gate-test-secret-that-is-long-enough"),
                ..Default::default()
            }),
            None,
            false,
        )
    }

    #[test]
    fn test_allow_list_is_prefix_based() {
        let config = GateConfig::default();
        assert!(config.is_public("/static/js/tools.js"));
        assert!(config.is_public("/Login"));
        assert!(config.is_public("/LoginHelp"));
        assert!(config.is_public("/favicon.ico"));
        assert!(!config.is_public("/"));
        assert!(!config.is_public("/Principal"));
        assert!(!config.is_public("/login"));
    }

    #[test]
    fn test_truthiness() {
        for falsy in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("U1"), json!([0]), json!({"a": 1})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None), "unknown");
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");

        headers.insert("x-real-ip", "172.16.0.3".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer)), "172.16.0.3");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_anonymous_requests_denied() {
        let config = GateConfig::default();
        let session = session();

        assert_eq!(
            evaluate(&config, &Method::POST, "/UploadData", &session).await.unwrap(),
            GateDecision::DenyJson
        );
        assert_eq!(
            evaluate(&config, &Method::GET, "/Principal", &session).await.unwrap(),
            GateDecision::DenyRedirect
        );
        assert_eq!(
            evaluate(&config, &Method::GET, "/Login", &session).await.unwrap(),
            GateDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_falsy_principal_blocks_get_but_not_post() {
        let config = GateConfig::default();
        let session = session();
        session.set("iduser", "").await.unwrap();

        assert_eq!(
            evaluate(&config, &Method::GET, "/Principal", &session).await.unwrap(),
            GateDecision::DenyRedirect
        );
        assert_eq!(
            evaluate(&config, &Method::POST, "/UploadData", &session).await.unwrap(),
            GateDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_logged_in_requests_pass() {
        let config = GateConfig::default();
        let session = session();
        session.set("iduser", "U1").await.unwrap();

        for method in [Method::GET, Method::POST, Method::DELETE] {
            assert_eq!(
                evaluate(&config, &method, "/Principal", &session).await.unwrap(),
                GateDecision::Allow
            );
        }
    }
}
