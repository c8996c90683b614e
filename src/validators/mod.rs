pub mod password;
pub mod username;

pub use password::validate_password;
pub use username::validate_username;

use serde::{Deserialize, Serialize};

/// Why a registration form was rejected. The `Display` text is shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Username cannot be empty")]
    UsernameEmpty,
    #[error("Username must be between 3 and 32 characters")]
    UsernameLength,
    #[error("Username may only contain letters, digits, '.', '_' and '-'")]
    UsernameInvalid,
    #[error("Password cannot be empty")]
    PasswordEmpty,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Password is too long (max 128 characters)")]
    PasswordTooLong,
}
