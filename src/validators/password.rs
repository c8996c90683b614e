use super::ValidationError;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

/// Checks a new password against the length policy.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }

    let length = password.chars().count();
    if length < MIN_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if length > MAX_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    Ok(())
}
