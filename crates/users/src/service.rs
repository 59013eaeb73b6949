//! User use-cases on top of a [`UserRepository`].

use std::sync::Arc;

use thiserror::Error;

use userhub_core::UserId;

use crate::{NewUser, RepositoryError, User, UserChanges, UserRepository, UserRole};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,

    /// The request is well-formed but not allowed (e.g. creating an admin).
    #[error("{0}")]
    Rejected(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail(email) => {
                ServiceError::Conflict(format!("email '{email}' is already taken"))
            }
            other => ServiceError::Repository(other),
        }
    }
}

const ADMIN_CREATION_REJECTED: &str = "creating admin users is not allowed";

/// Stateless facade over the repository; cheap to clone and share.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        if user.role == UserRole::Admin {
            tracing::warn!(email = %user.email, "rejected admin user creation");
            return Err(ServiceError::Rejected(ADMIN_CREATION_REJECTED.to_string()));
        }

        let created = self.repository.insert(user).await?;
        tracing::info!(user_id = %created.id, "user created");
        Ok(created)
    }

    pub async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, ServiceError> {
        if changes.role == Some(UserRole::Admin) {
            tracing::warn!(user_id = %id, "rejected promotion to admin");
            return Err(ServiceError::Rejected(ADMIN_CREATION_REJECTED.to_string()));
        }

        let updated = self
            .repository
            .update(id, changes)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(user_id = %id, "user updated");
        Ok(updated)
    }

    /// Delete a user and return the row as it was.
    pub async fn delete_user(&self, id: UserId) -> Result<User, ServiceError> {
        let user = self.get_user(id).await?;
        if !self.repository.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(user)
    }
}

impl core::fmt::Debug for UserService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}
