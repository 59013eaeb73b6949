//! User storage abstractions.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use userhub_core::UserId;

use crate::{NewUser, User, UserChanges};

pub use in_memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The unique email constraint rejected the write.
    #[error("email '{0}' is already taken")]
    DuplicateEmail(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Typed query interface over the `users` table.
///
/// Uniqueness of `email` is enforced here, by the store, rather than during
/// request validation.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Returns `None` when no row has `id`.
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, RepositoryError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}
