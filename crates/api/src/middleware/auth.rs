use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use userhub_auth::{JwtValidator, Principal};
use userhub_routing::{Middleware, Next};

use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

impl AuthState {
    pub fn new(jwt: Arc<dyn JwtValidator>) -> Self {
        Self { jwt }
    }
}

/// Requires a valid bearer token and stores the caller's [`PrincipalContext`].
pub fn auth(state: AuthState) -> Middleware {
    Middleware::from_fn("auth", move |mut req: Request, next: Next| {
        let state = state.clone();
        async move {
            let principal = match authenticate(&state, req.headers()) {
                Ok(principal) => principal,
                Err(reason) => {
                    tracing::debug!(reason, "request rejected by auth middleware");
                    return unauthenticated();
                }
            };

            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
    })
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<Principal, &'static str> {
    let token = extract_bearer(headers).map_err(|_| "missing or malformed bearer token")?;
    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(|_| "token failed validation")?;
    Ok(Principal::from(claims))
}

pub(crate) fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthenticated" })),
    )
        .into_response()
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
