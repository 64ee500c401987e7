//! Authentication Module
//! Mission: Stateless bearer-token auth with role-based route access

pub mod api;
pub mod envelope;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod user_store;

pub use api::AuthState;
pub use envelope::Envelope;
pub use error::ServiceError;
pub use jwt::JwtHandler;
pub use middleware::authenticate;
pub use models::{Principal, Role, User};
pub use password::PasswordHasher;
pub use policy::{authorize, AccessPolicy};
pub use user_store::UserStore;
