//! Authorization Policy
//! Mission: Static, ordered route-prefix rules checked before any handler
//!
//! Rules are evaluated first-match. A prefix `/admin` covers `/admin` and
//! everything below `/admin/`, but not `/adminuser`.

use crate::auth::{
    error::ServiceError,
    middleware::extract_principal,
    models::{Principal, Role},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// What a matched rule demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    AnyRole(Vec<Role>),
    Authenticated,
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub prefix: &'static str,
    pub access: Access,
}

impl AccessRule {
    pub fn new(prefix: &'static str, access: Access) -> Self {
        Self { prefix, access }
    }

    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    fallback: Access,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>, fallback: Access) -> Self {
        Self { rules, fallback }
    }

    /// Route table for the user-management API
    pub fn standard() -> Self {
        Self::new(
            vec![
                AccessRule::new("/auth", Access::PermitAll),
                AccessRule::new("/public", Access::PermitAll),
                AccessRule::new("/health", Access::PermitAll),
                AccessRule::new("/admin", Access::AnyRole(vec![Role::Admin])),
                AccessRule::new("/user", Access::AnyRole(vec![Role::User])),
                AccessRule::new("/adminuser", Access::AnyRole(vec![Role::Admin, Role::User])),
            ],
            Access::Authenticated,
        )
    }

    pub fn access_for(&self, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| &rule.access)
            .unwrap_or(&self.fallback)
    }

    pub fn check(&self, path: &str, principal: Option<&Principal>) -> Result<(), ServiceError> {
        match (self.access_for(path), principal) {
            (Access::PermitAll, _) => Ok(()),
            (_, None) => Err(ServiceError::Unauthenticated),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::AnyRole(roles), Some(principal)) if principal.has_any_role(roles) => Ok(()),
            (Access::AnyRole(_), Some(_)) => Err(ServiceError::Forbidden),
        }
    }
}

/// Enforce the policy; must run after `authenticate`
pub async fn authorize(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if let Err(err) = policy.check(path, extract_principal(&req)) {
        debug!("Denied {} {}: {}", req.method(), path, err);
        return err.into_response();
    }

    next.run(req).await
}
