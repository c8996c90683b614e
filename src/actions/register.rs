use crate::crypto::PasswordHasher;
use crate::validators::{validate_password, validate_username};
use crate::{AppError, SecretString, User, UserRepository};

/// Creates an account from the registration form.
pub struct RegisterAction<U: UserRepository, H: PasswordHasher> {
    user_repository: U,
    hasher: H,
}

impl<U: UserRepository, H: PasswordHasher> RegisterAction<U, H> {
    pub fn new(user_repository: U, hasher: H) -> Self {
        RegisterAction {
            user_repository,
            hasher,
        }
    }

    /// Validates the form and stores a new active account.
    ///
    /// # Errors
    ///
    /// - [`AppError::PasswordMismatch`] when the confirmation differs.
    /// - [`AppError::Validation`] for a malformed username or password.
    /// - [`AppError::UserAlreadyExists`] when the username is taken.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, password, confirm_password), err))]
    pub async fn execute(
        &self,
        username: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<User, AppError> {
        if password != confirm_password {
            return Err(AppError::PasswordMismatch);
        }

        validate_username(username)?;
        validate_password(password.expose_secret())?;

        if self
            .user_repository
            .find_user_by_username(username)
            .await?
            .is_some()
        {
            return Err(AppError::UserAlreadyExists);
        }

        let hashed = self.hasher.hash(password.expose_secret())?;
        let user = self.user_repository.create_user(username, &hashed).await?;

        log::info!(target: "agrosense::api", "msg=\"user registered\" iduser=\"{}\"", user.iduser);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Argon2Hasher;
    use crate::{InMemoryUserRepository, ValidationError};

    fn action(repo: &InMemoryUserRepository) -> RegisterAction<InMemoryUserRepository, Argon2Hasher> {
        RegisterAction::new(repo.clone(), Argon2Hasher::new(1024, 1, 1))
    }

    fn secret(value: &str) -> SecretString {
        SecretString::new(value)
    }

    #[tokio::test]
    async fn test_register_success() {
        let repo = InMemoryUserRepository::new();
        let user = action(&repo)
            .execute("ana", &secret("securepassword"), &secret("securepassword"))
            .await
            .unwrap();

        assert!(user.is_active());
        assert_ne!(user.hashed_password, "securepassword");
        assert!(repo.find_user_by_username("ana").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let repo = InMemoryUserRepository::new();
        let result = action(&repo)
            .execute("ana", &secret("securepassword"), &secret("securepasswort"))
            .await;

        assert_eq!(result.unwrap_err(), AppError::PasswordMismatch);
        assert!(repo.find_user_by_username("ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_username_taken() {
        let repo = InMemoryUserRepository::new();
        let register = action(&repo);
        register
            .execute("ana", &secret("securepassword"), &secret("securepassword"))
            .await
            .unwrap();

        let result = register
            .execute("ana", &secret("otherpassword"), &secret("otherpassword"))
            .await;
        assert_eq!(result.unwrap_err(), AppError::UserAlreadyExists);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let repo = InMemoryUserRepository::new();
        let register = action(&repo);

        let result = register.execute("ab", &secret("securepassword"), &secret("securepassword")).await;
        assert_eq!(
            result.unwrap_err(),
            AppError::Validation(ValidationError::UsernameLength)
        );

        let result = register.execute("ana", &secret("short"), &secret("short")).await;
        assert_eq!(
            result.unwrap_err(),
            AppError::Validation(ValidationError::PasswordTooShort)
        );
    }
}
