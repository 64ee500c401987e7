//! User Management Backend Library
//!
//! Registration, login, token refresh and admin CRUD over user records,
//! secured with stateless bearer tokens and role-based route rules.
//! Exposed as a library so the binary and integration tests share one router.

pub mod auth;
pub mod config;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::{AppConfig, JwtConfig};
pub use routes::create_router;
