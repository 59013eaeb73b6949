//! [`RouteSink`] backed by `axum::Router`.

use axum::Router;
use axum::extract::Request;
use axum::handler::Handler as AxumHandler;
use axum::routing::{self, MethodRouter};

use crate::{HandlerChain, HttpMethod, RouteSink};

/// Collects mounted routes into an axum router.
///
/// Paths use axum's `:name` parameter syntax. A single controller cannot
/// declare a method + path twice ([`crate::RouteTable::route`] rejects it);
/// two controllers mounting the same pair still panic inside axum, exactly
/// like calling `Router::route` twice.
#[derive(Debug)]
pub struct AxumRouteSink<S = ()> {
    router: Router<S>,
}

impl<S> AxumRouteSink<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn from_router(router: Router<S>) -> Self {
        Self { router }
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

impl<S> Default for AxumRouteSink<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn on<H, T, S>(method: HttpMethod, handler: H) -> MethodRouter<S>
where
    H: AxumHandler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    match method {
        HttpMethod::Get => routing::get(handler),
        HttpMethod::Post => routing::post(handler),
        HttpMethod::Put => routing::put(handler),
        HttpMethod::Patch => routing::patch(handler),
        HttpMethod::Delete => routing::delete(handler),
    }
}

impl<S> RouteSink for AxumRouteSink<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn register(&mut self, method: HttpMethod, path: &str, chain: HandlerChain) {
        let endpoint = if chain.is_bare() {
            let handler = chain.handler().clone();
            on(method, move |req: Request| handler.call(req))
        } else {
            on(method, move |req: Request| chain.call(req))
        };

        let router = std::mem::take(&mut self.router);
        self.router = router.route(path, endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Handler, Middleware, Next};
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use tower::ServiceExt;

    fn request(method: &str, uri: &str) -> Request {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn mounts_bare_and_wrapped_chains() {
        let tag = Middleware::from_fn("tag", |req, next: Next| async move {
            let mut res = next.run(req).await;
            res.headers_mut().insert("x-tag", HeaderValue::from_static("1"));
            res
        });

        let mut sink = AxumRouteSink::new();
        sink.register(
            HttpMethod::Get,
            "/bare",
            HandlerChain::bare(Handler::from_fn(|_req| async { StatusCode::OK })),
        );
        sink.register(
            HttpMethod::Post,
            "/bare",
            HandlerChain::new(vec![tag], Handler::from_fn(|_req| async { StatusCode::CREATED })),
        );
        let app = sink.into_router();

        let res = app.clone().oneshot(request("GET", "/bare")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get("x-tag").is_none());

        let res = app.clone().oneshot(request("POST", "/bare")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers().get("x-tag").unwrap(), "1");

        let res = app.oneshot(request("DELETE", "/bare")).await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
