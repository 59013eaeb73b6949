//! `userhub-auth` — token validation and caller identity.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use principal::Principal;
pub use roles::Role;
