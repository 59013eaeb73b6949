use axum::Json;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use userhub_routing::{Middleware, Next};

use crate::context::PrincipalContext;
use crate::middleware::auth::unauthenticated;

/// `role:<name>` — the caller must hold `<name>`.
///
/// Without a parameter only an authenticated caller is required. Must run after
/// `auth`; a request with no principal is answered with 401.
pub fn role(required: Option<&str>) -> Middleware {
    let required = required.map(str::to_string);

    Middleware::from_fn("role", move |req: Request, next: Next| {
        let required = required.clone();
        async move {
            let Some(ctx) = req.extensions().get::<PrincipalContext>() else {
                return unauthenticated();
            };

            if let Some(role) = required.as_deref() {
                if !ctx.principal().has_role(role) {
                    tracing::debug!(
                        subject = ctx.principal().subject(),
                        required = role,
                        "request rejected by role middleware"
                    );
                    return forbidden(role);
                }
            }

            next.run(req).await
        }
    })
}

fn forbidden(role: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": format!("Your account lacks the '{role}' role") })),
    )
        .into_response()
}
