use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppError;

/// Whether an account may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub iduser: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[cfg(test)]
impl User {
    pub fn mock_from_credentials(username: &str, hashed_password: &str) -> Self {
        User {
            iduser: crate::crypto::generate_token(crate::crypto::IDENTIFIER_LENGTH),
            username: username.to_owned(),
            hashed_password: hashed_password.to_owned(),
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// Account storage. The document database behind the real deployment is an
/// external collaborator; [`InMemoryUserRepository`](super::InMemoryUserRepository)
/// serves development and tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, iduser: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Creates an active account with a fresh `iduser`.
    async fn create_user(&self, username: &str, hashed_password: &str) -> Result<User, AppError>;
    async fn update_status(&self, iduser: &str, status: UserStatus) -> Result<(), AppError>;
}
