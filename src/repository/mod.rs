//! Account storage.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`UserRepository`] | Account lookup and creation |
//! | [`User`] | Account data |
//! | [`InMemoryUserRepository`] | Process-local implementation |

mod memory_user;
mod user;

pub use memory_user::InMemoryUserRepository;
pub use user::{User, UserRepository, UserStatus};
