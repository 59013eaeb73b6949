//! Middleware used by the HTTP surface.
//!
//! `auth` and `role` are looked up by alias through the registry built in
//! [`build_registry`]; `request_id` is handed to the applier directly and
//! `log_requests` wraps the whole router.

pub mod auth;
pub mod logging;
pub mod request_id;
pub mod role;

use userhub_routing::{MiddlewareFactory, MiddlewareRegistry, RoutingError};

pub use auth::{AuthState, auth};
pub use logging::log_requests;
pub use request_id::{REQUEST_ID_HEADER, request_id};
pub use role::role;

/// Registry with every alias controllers may declare.
pub fn build_registry(auth_state: AuthState) -> Result<MiddlewareRegistry, RoutingError> {
    let registry = MiddlewareRegistry::builder()
        .register("auth", MiddlewareFactory::plain(move || auth(auth_state.clone())))
        .register("role", MiddlewareFactory::new(role))
        .build()?;

    tracing::info!(aliases = ?registry.aliases(), "middleware registry built");
    Ok(registry)
}
