//! Sensitive data wrapper types.
//!
//! Keeps the cookie signing key and submitted passwords out of `Debug` and
//! `Display` output so they never reach a log line by accident.

use std::fmt;

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// # Example
///
/// ```rust
/// use agrosense::SecretString;
///
/// let key = SecretString::new("signing-key");
///
/// assert_eq!(format!("{:?}", key), "SecretString([REDACTED])");
/// assert_eq!(key.expose_secret(), "signing-key");
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new `SecretString` from any type that can be converted to a `String`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret value.
    ///
    /// Call this only at the point the raw bytes are needed, such as when
    /// keying an HMAC or hashing a password.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the secret in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let secret = SecretString::new("hunter2-hunter2");
        assert_eq!(format!("{secret:?}"), "SecretString([REDACTED])");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn test_length_helpers() {
        assert!(SecretString::new("").is_empty());
        assert_eq!(SecretString::from("abcd").len(), 4);
        assert_eq!(SecretString::from(String::from("key")).expose_secret(), "key");
    }
}
