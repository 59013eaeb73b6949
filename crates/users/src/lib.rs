//! `userhub-users` — the user resource: entity, request validation, storage
//! and the service the HTTP layer talks to.

pub mod dto;
pub mod repository;
pub mod service;
pub mod user;

pub use dto::{CreateUserRequest, NewUser, UpdateUserRequest, UserChanges, ValidationErrors};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, RepositoryError, UserRepository};
pub use service::{ServiceError, UserService};
pub use user::{User, UserRole};
