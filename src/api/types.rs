use std::fmt;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_OK: u8 = 0;
pub const STATUS_ERROR: u8 = 1;

/// The JSON body every API route answers with: `{status, msg, ...extra}`.
///
/// `status` is `0` for success and `1` for a user-facing failure. Extra keys
/// such as `redirect` are flattened into the top-level object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u8,
    pub msg: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK,
            msg: String::new(),
            extra: Map::new(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            msg: msg.into(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Tells the browser script where to navigate next.
    #[must_use]
    pub fn redirect(self, to: &str) -> Self {
        self.with("redirect", to)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// Request DTOs

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

/// Re-confirmation of the logged-in account by the page script.
#[derive(Debug, Deserialize)]
pub struct SecurityCheckRequest {
    pub const_iduser: String,
    pub input_iduser: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_flattens_extra_keys() {
        let envelope = Envelope::error("Login required").redirect("/Login");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": 1, "msg": "Login required", "redirect": "/Login"})
        );
    }

    #[test]
    fn test_ok_envelope_is_minimal() {
        assert_eq!(
            serde_json::to_value(Envelope::ok()).unwrap(),
            json!({"status": 0, "msg": ""})
        );
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let request = RegisterRequest {
            username: "ana".to_owned(),
            password: "hunter22hunter".to_owned(),
            confirm_password: "hunter22hunter".to_owned(),
        };
        let debug = format!("{request:?}");
        assert!(debug.contains("ana"));
        assert!(!debug.contains("hunter22"));
    }
}
