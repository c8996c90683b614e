use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use password_hash::{PasswordHash, PasswordHasher as ArgonPasswordHasher, SaltString};
use rand::rngs::OsRng;

use crate::AppError;

/// Length of generated session and user identifiers, in characters.
///
/// 32 alphanumeric characters carry roughly 190 bits of entropy.
pub const IDENTIFIER_LENGTH: usize = 32;

/// Trait for password hashing and verification.
///
/// # Example
///
/// ```rust
/// use agrosense::crypto::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new(1024, 1, 1);
/// let hash = hasher.hash("correct horse").unwrap();
/// assert!(hasher.verify("correct horse", &hash).unwrap());
/// assert!(!hasher.verify("battery staple", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
    /// Hash a password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHashError` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Verify a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHashError` if the stored hash is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// Argon2id password hasher with configurable parameters.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    /// Memory cost in KiB
    memory_cost: u32,
    /// Number of iterations
    time_cost: u32,
    /// Degree of parallelism
    parallelism: u32,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB - argon2 default
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Hasher {
    #[must_use]
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// 64 MiB memory, 3 iterations, 4 lanes.
    #[must_use]
    pub fn production() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|_| AppError::PasswordHashError)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| AppError::PasswordHashError)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AppError::PasswordHashError)?;

        // parameters are read back from the PHC string
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Generates a cryptographically secure random alphanumeric token.
pub fn generate_token(length: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Mints a fresh session identifier.
pub fn generate_session_id() -> String {
    generate_token(IDENTIFIER_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_alphabet() {
        let token = generate_token(64);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), IDENTIFIER_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn test_argon2_salts_each_hash() {
        let hasher = Argon2Hasher::new(1024, 1, 1);
        let first = hasher.hash("fieldpassword").unwrap();
        let second = hasher.hash("fieldpassword").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("fieldpassword", &first).unwrap());
        assert!(hasher.verify("fieldpassword", &second).unwrap());
        assert!(!hasher.verify("otherpassword", &first).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = Argon2Hasher::default();
        assert_eq!(
            hasher.verify("anything", "not-a-phc-string"),
            Err(AppError::PasswordHashError)
        );
    }
}
