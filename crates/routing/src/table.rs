//! Per-controller route declarations.
//!
//! A controller builds a [`RouteTable`] from its `routes()` function:
//!
//! ```ignore
//! let mut table = RouteTable::new();
//! table.handler("show", Self::show);
//! table.get("/user/:id", "show")?.middleware("show", ["auth"])?;
//! ```
//!
//! Handlers are registered under a name first; route and middleware
//! declarations then refer to that name, so a declaration can never point at
//! something that cannot be invoked.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;

use crate::{HttpMethod, RoutingError};

type BoundFn<C> = dyn Fn(Arc<C>, Request) -> BoxFuture<'static, Response> + Send + Sync;

/// A group of routes that share one instance per [`crate::apply`] call.
///
/// Instances are shared by every concurrent request to the controller's routes,
/// so they should only hold injected collaborators.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Whatever the controller needs to construct itself.
    type Context;

    fn create(context: &Self::Context) -> anyhow::Result<Self>;

    fn routes() -> Result<RouteTable<Self>, RoutingError>;
}

/// One method + path bound to a named controller handler.
pub struct RouteDescriptor<C> {
    method: HttpMethod,
    path: String,
    handler: Arc<BoundFn<C>>,
    handler_identity: String,
}

impl<C> RouteDescriptor<C> {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler_identity(&self) -> &str {
        &self.handler_identity
    }

    /// Invoke the handler with `instance` as its receiver.
    pub fn invoke(&self, instance: Arc<C>, req: Request) -> BoxFuture<'static, Response> {
        (self.handler)(instance, req)
    }
}

impl<C> Clone for RouteDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            handler: self.handler.clone(),
            handler_identity: self.handler_identity.clone(),
        }
    }
}

impl<C> core::fmt::Debug for RouteDescriptor<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler_identity", &self.handler_identity)
            .finish()
    }
}

/// Route metadata for one controller type.
///
/// Routes are kept in declaration order. Middleware attachments are keyed by
/// handler name; declaring middleware twice for the same handler replaces the
/// earlier list.
pub struct RouteTable<C> {
    handlers: HashMap<String, Arc<BoundFn<C>>>,
    routes: Vec<RouteDescriptor<C>>,
    middleware: HashMap<String, Vec<String>>,
}

impl<C> Default for RouteTable<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            routes: Vec::new(),
            middleware: HashMap::new(),
        }
    }
}

impl<C> core::fmt::Debug for RouteTable<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

impl<C: Send + Sync + 'static> RouteTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invocable body under `identity`.
    pub fn handler<F, Fut, R>(&mut self, identity: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let bound: Arc<BoundFn<C>> = Arc::new(
            move |instance: Arc<C>, req: Request| -> BoxFuture<'static, Response> {
                let fut = f(instance, req);
                Box::pin(async move { fut.await.into_response() })
            },
        );
        self.handlers.insert(identity.into(), bound);
        self
    }

    /// Append a route for `method` + `path` served by the handler named `identity`.
    ///
    /// A method + path pair may only be declared once per table.
    pub fn route(
        &mut self,
        method: HttpMethod,
        path: impl Into<String>,
        identity: &str,
    ) -> Result<&mut Self, RoutingError> {
        let handler = self
            .handlers
            .get(identity)
            .cloned()
            .ok_or_else(|| RoutingError::invalid_target(identity))?;

        let path = path.into();
        if self.routes.iter().any(|r| r.method == method && r.path == path) {
            return Err(RoutingError::DuplicateRoute { method, path });
        }

        self.routes.push(RouteDescriptor {
            method,
            path,
            handler,
            handler_identity: identity.to_string(),
        });
        Ok(self)
    }

    pub fn get(&mut self, path: impl Into<String>, identity: &str) -> Result<&mut Self, RoutingError> {
        self.route(HttpMethod::Get, path, identity)
    }

    pub fn post(&mut self, path: impl Into<String>, identity: &str) -> Result<&mut Self, RoutingError> {
        self.route(HttpMethod::Post, path, identity)
    }

    pub fn put(&mut self, path: impl Into<String>, identity: &str) -> Result<&mut Self, RoutingError> {
        self.route(HttpMethod::Put, path, identity)
    }

    pub fn patch(&mut self, path: impl Into<String>, identity: &str) -> Result<&mut Self, RoutingError> {
        self.route(HttpMethod::Patch, path, identity)
    }

    pub fn delete(&mut self, path: impl Into<String>, identity: &str) -> Result<&mut Self, RoutingError> {
        self.route(HttpMethod::Delete, path, identity)
    }

    /// Attach middleware aliases to the handler named `identity`, in the given order.
    pub fn middleware<I, S>(&mut self, identity: &str, aliases: I) -> Result<&mut Self, RoutingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.handlers.contains_key(identity) {
            return Err(RoutingError::invalid_target(identity));
        }

        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if let Some(previous) = self.middleware.insert(identity.to_string(), aliases) {
            tracing::debug!(
                handler = identity,
                replaced = ?previous,
                "middleware redeclared; previous list replaced"
            );
        }
        Ok(self)
    }
}

impl<C> RouteTable<C> {
    pub fn routes(&self) -> &[RouteDescriptor<C>] {
        &self.routes
    }

    /// Aliases attached to `identity`; empty when none were declared.
    pub fn middleware_aliases(&self, identity: &str) -> &[String] {
        self.middleware.get(identity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}
