//! HTTP API: configuration, middleware, controllers and router assembly.

pub mod app;
pub mod config;
pub mod context;
pub mod controllers;
pub mod errors;
pub mod middleware;
