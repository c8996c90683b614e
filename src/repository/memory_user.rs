use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::user::{User, UserRepository, UserStatus};
use crate::crypto::{generate_token, IDENTIFIER_LENGTH};
use crate::AppError;

/// Accounts kept in process memory, keyed by `iduser`. Clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user_by_id(&self, iduser: &str) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .read()
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(users.get(iduser).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .read()
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, hashed_password), err))]
    async fn create_user(&self, username: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if users.values().any(|u| u.username == username) {
            return Err(AppError::UserAlreadyExists);
        }

        let user = User {
            iduser: generate_token(IDENTIFIER_LENGTH),
            username: username.to_owned(),
            hashed_password: hashed_password.to_owned(),
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        users.insert(user.iduser.clone(), user.clone());

        Ok(user)
    }

    async fn update_status(&self, iduser: &str, status: UserStatus) -> Result<(), AppError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        match users.get_mut(iduser) {
            Some(user) => {
                user.status = status;
                Ok(())
            }
            None => Err(AppError::UserNotFound),
        }
    }
}
