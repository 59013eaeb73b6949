//! `userhub-routing` — declarative route and middleware registration.
//!
//! Controllers describe their endpoints with a [`RouteTable`] and attach named
//! middleware to individual handlers. At start-up [`apply`] instantiates the
//! controller once, resolves every alias through a [`MiddlewareRegistry`] and
//! mounts each route on a [`RouteSink`] (usually [`AxumRouteSink`]).
//!
//! The layout mirrors the lifecycle:
//! - `registry.rs`: alias → middleware factory table, built once
//! - `resolver.rs`: `alias` / `alias:param` strings → middleware
//! - `table.rs`: per-controller route declarations
//! - `apply.rs`: resolve everything, then register everything
//! - `sink.rs`: the axum-backed router adapter

pub mod apply;
pub mod error;
pub mod method;
pub mod middleware;
pub mod registry;
pub mod resolver;
pub mod sink;
pub mod table;

pub use apply::{InjectedMiddleware, RouteSink, apply};
pub use error::RoutingError;
pub use method::HttpMethod;
pub use middleware::{Handler, HandlerChain, Middleware, Next};
pub use registry::{MiddlewareFactory, MiddlewareRegistry, MiddlewareRegistryBuilder};
pub use resolver::{MiddlewareResolver, parse_alias};
pub use sink::AxumRouteSink;
pub use table::{Controller, RouteDescriptor, RouteTable};
