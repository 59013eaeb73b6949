use thiserror::Error;

use crate::HttpMethod;

/// Failures raised while declaring or mounting routes.
///
/// All of these are start-up errors: the process is expected to abort rather
/// than serve a partially wired router.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A route or middleware declaration named a handler with no registered body.
    #[error("invalid decorator target: `{method}` has no invocable handler")]
    InvalidDecoratorTarget { method: String },

    /// The same method and path were declared twice in one controller.
    #[error("route `{method} {path}` declared more than once")]
    DuplicateRoute { method: HttpMethod, path: String },

    /// An alias has no factory in the middleware registry.
    #[error("middleware `{alias}` not found")]
    MiddlewareNotFound { alias: String },

    /// The same alias was registered twice while building the registry.
    #[error("middleware alias `{alias}` registered more than once")]
    DuplicateAlias { alias: String },

    /// The controller could not be constructed.
    #[error("failed to instantiate controller `{controller}`: {source}")]
    Instantiation {
        controller: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl RoutingError {
    pub fn invalid_target(method: impl Into<String>) -> Self {
        Self::InvalidDecoratorTarget {
            method: method.into(),
        }
    }

    pub fn not_found(alias: impl Into<String>) -> Self {
        Self::MiddlewareNotFound {
            alias: alias.into(),
        }
    }
}
