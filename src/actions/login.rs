use crate::crypto::PasswordHasher;
use crate::{AppError, SecretString, User, UserRepository};

/// Checks a username and password against stored accounts.
pub struct LoginAction<U: UserRepository, H: PasswordHasher> {
    user_repository: U,
    hasher: H,
}

impl<U: UserRepository, H: PasswordHasher> LoginAction<U, H> {
    pub fn new(user_repository: U, hasher: H) -> Self {
        LoginAction {
            user_repository,
            hasher,
        }
    }

    /// Returns the account when the credentials match an active user.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with
    /// [`AppError::InvalidCredentials`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, password), err))]
    pub async fn execute(&self, username: &str, password: &SecretString) -> Result<User, AppError> {
        let Some(user) = self.user_repository.find_user_by_username(username).await? else {
            log::info!(target: "agrosense::api", "msg=\"login failed\" reason=\"unknown user\"");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(password.expose_secret(), &user.hashed_password)? {
            log::info!(target: "agrosense::api", "msg=\"login failed\" reason=\"wrong password\"");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active() {
            log::info!(target: "agrosense::api", "msg=\"login failed\" reason=\"inactive account\"");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}
