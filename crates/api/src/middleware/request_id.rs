use axum::extract::Request;
use axum::http::HeaderValue;

use userhub_routing::{Middleware, Next};

use crate::context::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_INCOMING_LEN: usize = 128;

/// Reuses an incoming `x-request-id` (when short and printable) or generates one,
/// stores it as [`RequestId`] and echoes it on the response.
pub fn request_id() -> Middleware {
    Middleware::from_fn("requestId", |mut req: Request, next: Next| async move {
        let id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_INCOMING_LEN)
            .map(RequestId::new)
            .unwrap_or_else(RequestId::generate);

        req.extensions_mut().insert(id.clone());
        let mut res = next.run(req).await;

        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        res
    })
}
