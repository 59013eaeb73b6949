//! Alias → middleware factory table.
//!
//! The registry is assembled once at start-up through [`MiddlewareRegistryBuilder`]
//! and is read-only afterwards; it is handed to the resolver by reference.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Middleware, RoutingError};

type FactoryFn = dyn Fn(Option<&str>) -> Middleware + Send + Sync;

/// Produces a middleware, optionally parameterized (`role:admin` → `Some("admin")`).
#[derive(Clone)]
pub struct MiddlewareFactory(Arc<FactoryFn>);

impl MiddlewareFactory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&str>) -> Middleware + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A factory that takes no parameter; a supplied one is ignored.
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn() -> Middleware + Send + Sync + 'static,
    {
        Self(Arc::new(move |_param: Option<&str>| f()))
    }

    pub fn produce(&self, param: Option<&str>) -> Middleware {
        (self.0)(param)
    }
}

impl core::fmt::Debug for MiddlewareFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("MiddlewareFactory")
    }
}

#[derive(Debug, Default)]
pub struct MiddlewareRegistryBuilder {
    factories: HashMap<String, MiddlewareFactory>,
    duplicate: Option<String>,
}

impl MiddlewareRegistryBuilder {
    pub fn register(mut self, alias: impl Into<String>, factory: MiddlewareFactory) -> Self {
        let alias = alias.into();
        if self.factories.contains_key(&alias) {
            self.duplicate.get_or_insert(alias);
            return self;
        }
        self.factories.insert(alias, factory);
        self
    }

    pub fn build(self) -> Result<MiddlewareRegistry, RoutingError> {
        if let Some(alias) = self.duplicate {
            return Err(RoutingError::DuplicateAlias { alias });
        }
        Ok(MiddlewareRegistry {
            factories: self.factories,
        })
    }
}

/// Immutable alias table. Lookups are exact and case-sensitive.
#[derive(Debug, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    pub fn builder() -> MiddlewareRegistryBuilder {
        MiddlewareRegistryBuilder::default()
    }

    pub fn lookup(&self, alias: &str) -> Option<&MiddlewareFactory> {
        self.factories.get(alias)
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }
}
