//! Alias strings → invocable middleware.

use crate::{Middleware, MiddlewareRegistry, RoutingError};

/// Split an alias entry on its first `:`.
///
/// `"role:admin"` → `("role", Some("admin"))`. Everything after the first colon is
/// the parameter, verbatim. An empty parameter (`"role:"`) counts as none.
pub fn parse_alias(entry: &str) -> (&str, Option<&str>) {
    match entry.split_once(':') {
        Some((name, param)) if !param.is_empty() => (name, Some(param)),
        Some((name, _)) => (name, None),
        None => (entry, None),
    }
}

/// Resolves alias lists against a registry.
#[derive(Debug, Clone, Copy)]
pub struct MiddlewareResolver<'a> {
    registry: &'a MiddlewareRegistry,
}

impl<'a> MiddlewareResolver<'a> {
    pub fn new(registry: &'a MiddlewareRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve_one(&self, entry: &str) -> Result<Middleware, RoutingError> {
        let (name, param) = parse_alias(entry);
        let factory = self.registry.lookup(name).ok_or_else(|| {
            tracing::error!(alias = name, entry, "middleware alias is not registered");
            RoutingError::not_found(name)
        })?;

        Ok(factory.produce(param).renamed(entry.to_string()))
    }

    /// Resolve every entry, preserving order. The first unknown alias aborts.
    pub fn resolve<I, S>(&self, entries: I) -> Result<Vec<Middleware>, RoutingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|entry| self.resolve_one(entry.as_ref()))
            .collect()
    }
}
