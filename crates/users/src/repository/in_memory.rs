use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use userhub_core::{Entity, UserId};

use super::{RepositoryError, UserRepository};
use crate::{NewUser, User, UserChanges};

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    users: BTreeMap<UserId, User>,
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Rows>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

fn email_taken(rows: &Rows, email: &str, except: Option<UserId>) -> bool {
    rows.users
        .values()
        .any(|u| u.email == email && Some(u.id()) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.users.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        if email_taken(&rows, &user.email, None) {
            return Err(RepositoryError::DuplicateEmail(user.email));
        }

        rows.next_id += 1;
        let now = Utc::now();
        let stored = User {
            id: UserId::new(rows.next_id),
            name: user.name,
            email: user.email,
            role: Some(user.role),
            created_at: Some(now),
            updated_at: Some(now),
        };
        rows.users.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, RepositoryError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        if let Some(email) = &changes.email {
            if email_taken(&rows, email, Some(id)) {
                return Err(RepositoryError::DuplicateEmail(email.clone()));
            }
        }

        let Some(user) = rows.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = Some(role);
        }
        user.updated_at = Some(Utc::now());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(rows.users.remove(&id).is_some())
    }
}
