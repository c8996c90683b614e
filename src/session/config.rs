use chrono::Duration;

use crate::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    #[default]
    Lax,
    Strict,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::None => cookie::SameSite::None,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::Strict => cookie::SameSite::Strict,
        }
    }
}

/// Cookie contract and signing key for the session layer.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    /// Lifetime advertised to the browser through `Max-Age`.
    pub cookie_max_age: Duration,
    /// Hosts served over plain HTTP; cookies issued to them omit `Secure`.
    pub insecure_hosts: Vec<String>,
    pub secret_key: SecretString,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "idsession".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            cookie_max_age: Duration::days(365),
            insecure_hosts: vec!["127.0.0.1".to_owned(), "localhost".to_owned()],
            secret_key: SecretString::new(""),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.secret_key.is_empty() {
            return Err("secret_key must not be empty");
        }
        if self.secret_key.len() < 32 {
            return Err("secret_key should be at least 32 bytes");
        }
        if self.cookie_name.is_empty() {
            return Err("cookie_name must not be empty");
        }
        Ok(())
    }

    /// Whether a cookie issued for `host` carries the `Secure` attribute.
    ///
    /// `host` may include a port; it is compared without it.
    pub fn is_secure_host(&self, host: &str) -> bool {
        let hostname = host.split(':').next().unwrap_or(host);
        !self.insecure_hosts.iter().any(|h| h == hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_cookie_contract() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "idsession");
        assert_eq!(config.cookie_path, "/");
        assert!(config.cookie_http_only);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
        assert_eq!(config.cookie_max_age.num_seconds(), 31_536_000);
    }

    #[test]
    fn test_validate_rejects_missing_or_short_secret() {
        assert!(SessionConfig::default().validate().is_err());

        let short = SessionConfig {
            secret_key: SecretString::new("short"),
            ..Default::default()
        };
        assert!(short.validate().is_err());

        let valid = SessionConfig {
            secret_key: SecretString::new("a-field-advisory-secret-of-decent-length"),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_loopback_hosts_are_insecure() {
        let config = SessionConfig::default();
        assert!(!config.is_secure_host("localhost"));
        assert!(!config.is_secure_host("localhost:7100"));
        assert!(!config.is_secure_host("127.0.0.1:8080"));
        assert!(config.is_secure_host("fields.example.com"));
        assert!(config.is_secure_host("fields.example.com:443"));
    }
}
