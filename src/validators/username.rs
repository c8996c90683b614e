use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

#[allow(clippy::expect_used)]
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }

    let length = username.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(ValidationError::UsernameLength);
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::UsernameInvalid);
    }

    Ok(())
}
