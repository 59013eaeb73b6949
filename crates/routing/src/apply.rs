//! Mount a controller's routes on a router.

use std::sync::Arc;

use crate::{
    Controller, Handler, HandlerChain, HttpMethod, Middleware, MiddlewareRegistry,
    MiddlewareResolver, RoutingError,
};

/// The router primitive routes are mounted on.
pub trait RouteSink {
    fn register(&mut self, method: HttpMethod, path: &str, chain: HandlerChain);
}

/// Middleware supplied by the caller of [`apply`], added to every route after the
/// route's own middleware.
#[derive(Debug, Clone)]
pub enum InjectedMiddleware {
    /// Resolved through the registry like a declared alias.
    Alias(String),
    /// Used as-is.
    Direct(Middleware),
}

impl From<&str> for InjectedMiddleware {
    fn from(value: &str) -> Self {
        Self::Alias(value.to_string())
    }
}

impl From<String> for InjectedMiddleware {
    fn from(value: String) -> Self {
        Self::Alias(value)
    }
}

impl From<Middleware> for InjectedMiddleware {
    fn from(value: Middleware) -> Self {
        Self::Direct(value)
    }
}

/// Instantiate `C` once and mount every route it declares on `sink`.
///
/// Each chain is `declared middleware → injected middleware → handler`, with the
/// handler bound to the single controller instance. Every chain is resolved
/// before the first registration, so an unknown alias leaves `sink` untouched.
pub fn apply<C, S>(
    sink: &mut S,
    context: &C::Context,
    registry: &MiddlewareRegistry,
    injected: &[InjectedMiddleware],
) -> Result<(), RoutingError>
where
    C: Controller,
    S: RouteSink + ?Sized,
{
    let controller = std::any::type_name::<C>();
    let table = C::routes()?;

    let instance = Arc::new(C::create(context).map_err(|source| {
        tracing::error!(controller, error = %source, "controller instantiation failed");
        RoutingError::Instantiation { controller, source }
    })?);

    if table.is_empty() {
        tracing::debug!(controller, "controller declares no routes");
        return Ok(());
    }

    let resolver = MiddlewareResolver::new(registry);
    let mut mounts = Vec::with_capacity(table.len());

    for route in table.routes() {
        let mut middleware = resolver.resolve(table.middleware_aliases(route.handler_identity()))?;
        for extra in injected {
            middleware.push(match extra {
                InjectedMiddleware::Alias(entry) => resolver.resolve_one(entry)?,
                InjectedMiddleware::Direct(mw) => mw.clone(),
            });
        }

        let descriptor = route.clone();
        let receiver = instance.clone();
        let handler = Handler::from_fn(move |req| descriptor.invoke(receiver.clone(), req));

        mounts.push((route, HandlerChain::new(middleware, handler)));
    }

    for (route, chain) in mounts {
        tracing::info!(
            controller,
            method = %route.method(),
            path = route.path(),
            handler = route.handler_identity(),
            middleware = ?chain.middleware_names(),
            "route mounted"
        );
        sink.register(route.method(), route.path(), chain);
    }

    Ok(())
}
