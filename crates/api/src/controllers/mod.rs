//! Controllers mounted through `userhub_routing::apply`.

pub mod user;

pub use user::UserController;
