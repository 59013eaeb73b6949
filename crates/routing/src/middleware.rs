//! Middleware, handlers and the chain that runs them.
//!
//! A chain is an ordered list of [`Middleware`] followed by one terminal
//! [`Handler`]. Each middleware receives the request plus a [`Next`]; it either
//! answers on its own (short-circuit) or calls [`Next::run`] to hand the request
//! to the following link.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;
type HandlerFn = dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync;

/// A named, invocable middleware.
///
/// The name is what shows up in logs and in [`HandlerChain::middleware_names`];
/// for registry-produced middleware it is the alias (including any parameter).
#[derive(Clone)]
pub struct Middleware {
    name: Cow<'static, str>,
    func: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn from_fn<F, Fut, R>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |req: Request, next: Next| -> BoxFuture<'static, Response> {
                let fut = f(req, next);
                Box::pin(async move { fut.await.into_response() })
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the same middleware under another name.
    pub fn renamed(self, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            func: self.func,
        }
    }

    pub fn call(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        (self.func)(req, next)
    }
}

impl core::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// Terminal request handler of a chain.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self(Arc::new(move |req: Request| -> BoxFuture<'static, Response> {
            let fut = f(req);
            Box::pin(async move { fut.await.into_response() })
        }))
    }

    pub fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        (self.0)(req)
    }
}

impl core::fmt::Debug for Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Handler")
    }
}

/// The remainder of a chain, as seen from inside a middleware.
pub struct Next {
    middleware: Arc<[Middleware]>,
    position: usize,
    handler: Handler,
}

impl Next {
    /// Run the next middleware, or the handler once the middleware is exhausted.
    pub fn run(self, req: Request) -> BoxFuture<'static, Response> {
        match self.middleware.get(self.position).cloned() {
            Some(current) => {
                let next = Next {
                    middleware: self.middleware,
                    position: self.position + 1,
                    handler: self.handler,
                };
                current.call(req, next)
            }
            None => self.handler.call(req),
        }
    }
}

/// Ordered middleware followed by the terminal handler.
#[derive(Clone, Debug)]
pub struct HandlerChain {
    middleware: Arc<[Middleware]>,
    handler: Handler,
}

impl HandlerChain {
    pub fn new(middleware: Vec<Middleware>, handler: Handler) -> Self {
        Self {
            middleware: middleware.into(),
            handler,
        }
    }

    /// A chain consisting of the handler alone.
    pub fn bare(handler: Handler) -> Self {
        Self::new(Vec::new(), handler)
    }

    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    pub fn middleware_names(&self) -> Vec<&str> {
        self.middleware.iter().map(Middleware::name).collect()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn is_bare(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Run the whole chain for one request.
    pub fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        Next {
            middleware: self.middleware.clone(),
            position: 0,
            handler: self.handler.clone(),
        }
        .run(req)
    }
}
