//! Router assembly.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use userhub_auth::Hs256JwtValidator;
use userhub_routing::{AxumRouteSink, RoutingError, apply};
use userhub_users::{InMemoryUserRepository, UserRepository, UserService};

use crate::controllers::UserController;
use crate::middleware::{self, AuthState, build_registry, request_id};

/// Build the full application router.
///
/// Fails when a controller references a middleware alias that is not
/// registered, or cannot be instantiated.
pub fn build_app(users: UserService, auth: AuthState) -> Result<Router, RoutingError> {
    let registry = build_registry(auth)?;

    let mut sink = AxumRouteSink::from_router(Router::new().route("/health", get(health)));
    apply::<UserController, _>(&mut sink, &users, &registry, &[request_id().into()])?;

    Ok(sink
        .into_router()
        .layer(axum::middleware::from_fn(middleware::log_requests)))
}

/// Router over an empty in-memory store, authenticating with an HS256 `jwt_secret`.
pub fn build_in_memory_app(jwt_secret: &str) -> Result<Router, RoutingError> {
    let repository: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    build_app(
        UserService::new(repository),
        AuthState::new(Arc::new(Hs256JwtValidator::new(jwt_secret))),
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
