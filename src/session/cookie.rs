//! Signed cookie helpers for the session layer.
//!
//! Session identifiers travel as `{session_id}.{hex(hmac_sha256(secret, session_id))}`.
//! Verification recovers the exact identifier or fails with
//! [`SessionError::InvalidSignature`].

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::time::Duration as CookieDuration;
use cookie::Cookie;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{SessionConfig, SessionError};
use crate::SecretString;

type HmacSha256 = Hmac<Sha256>;

/// Signs a session ID with HMAC-SHA256.
pub fn sign_session_id(session_id: &str, secret: &SecretString) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(session_id.as_bytes());
    format!("{}.{}", session_id, hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signed cookie value and extracts the session ID.
///
/// # Errors
///
/// Returns [`SessionError::InvalidSignature`] when the value is malformed or
/// the signature does not match the embedded identifier under `secret`.
pub fn verify_signed_cookie(
    cookie_value: &str,
    secret: &SecretString,
) -> Result<String, SessionError> {
    let (session_id, signature_hex) = cookie_value
        .rsplit_once('.')
        .ok_or(SessionError::InvalidSignature)?;
    if session_id.is_empty() {
        return Err(SessionError::InvalidSignature);
    }

    let signature = hex::decode(signature_hex).map_err(|_| SessionError::InvalidSignature)?;

    let mut mac = keyed_mac(secret);
    mac.update(session_id.as_bytes());
    mac.verify_slice(&signature).map_err(|_| {
        log::warn!(
            target: "agrosense::session",
            "msg=\"session cookie signature mismatch\" cookie_prefix=\"{}...\"",
            cookie_value.chars().take(8).collect::<String>()
        );
        SessionError::InvalidSignature
    })?;

    Ok(session_id.to_owned())
}

fn keyed_mac(secret: &SecretString) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size");
    mac
}

/// Reads the raw value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| Cookie::split_parse(header.to_owned()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_owned())
}

/// Builds the `Set-Cookie` carrying a signed session identifier.
pub fn build_session_cookie(
    signed_value: String,
    secure: bool,
    config: &SessionConfig,
) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), signed_value))
        .path(config.cookie_path.clone())
        .http_only(config.cookie_http_only)
        .same_site(config.cookie_same_site.into())
        .secure(secure)
        .max_age(CookieDuration::seconds(config.cookie_max_age.num_seconds()))
        .build()
}

/// Builds the `Set-Cookie` that makes the browser drop the session cookie.
pub fn build_removal_cookie(secure: bool, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path(config.cookie_path.clone())
        .http_only(config.cookie_http_only)
        .same_site(config.cookie_same_site.into())
        .secure(secure)
        .max_age(CookieDuration::ZERO)
        .build()
}
