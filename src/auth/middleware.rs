//! Authentication Middleware
//! Mission: Turn a bearer token into a request-scoped principal
//!
//! Never rejects: a missing or bad token leaves the request unauthenticated
//! and the authorization policy decides what happens next.

use crate::auth::{api::AuthState, models::Principal};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

pub async fn authenticate(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    // Re-entrant chains: keep a principal set further out
    if extract_principal(&req).is_none() {
        if let Some(principal) = resolve_principal(&state, req.headers()) {
            debug!(
                "Authenticated {} id={} ({})",
                principal.email, principal.user_id, principal.role
            );
            req.extensions_mut().insert(principal);
        }
    }

    next.run(req).await
}

/// Token from an `Authorization: Bearer <token>` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve the principal for a request, or `None` when it stays unauthenticated
pub fn resolve_principal(state: &AuthState, headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers)?;

    let subject = match state.jwt_handler.extract_subject(token) {
        Ok(subject) => subject,
        Err(_) => {
            debug!("Ignoring unverifiable bearer token");
            return None;
        }
    };

    let user = match state.user_store.find_by_email(&subject) {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("Token subject {} has no account", subject);
            return None;
        }
        Err(e) => {
            warn!("User lookup failed during authentication: {}", e);
            return None;
        }
    };

    if !state.jwt_handler.is_valid(token, &user.email) {
        debug!("Expired token presented for {}", user.email);
        return None;
    }

    Some(Principal::from_user(&user))
}

/// Principal attached by `authenticate` (use after the middleware)
pub fn extract_principal(req: &Request) -> Option<&Principal> {
    req.extensions().get::<Principal>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{
            jwt::JwtHandler,
            models::{NewUser, Role},
            password::PasswordHasher,
            user_store::UserStore,
        },
        config::{JwtConfig, DEV_JWT_SECRET},
    };
    use axum::{
        body::{to_bytes, Body},
        http::HeaderValue,
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::Map;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn whoami_router(state: AuthState) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|principal: Option<Extension<Principal>>| async move {
                    principal
                        .map(|Extension(p)| p.email)
                        .unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .layer(from_fn_with_state(state, authenticate))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn test_state() -> AuthState {
        let store = UserStore::in_memory().unwrap();
        store
            .create_user(&NewUser {
                email: "a@x.com".to_string(),
                name: "Ada".to_string(),
                city: None,
                role: Role::User,
                password_hash: "$2b$04$hash".to_string(),
            })
            .unwrap();

        AuthState::new(
            Arc::new(store),
            Arc::new(JwtHandler::new(&JwtConfig::new(DEV_JWT_SECRET, 24).unwrap())),
            PasswordHasher::new(4),
        )
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("Bearer   ")), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_valid_token_resolves_principal() {
        let state = test_state();
        let token = state.jwt_handler.issue_access_token("a@x.com").unwrap();

        let principal = resolve_principal(&state, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(principal.email, "a@x.com");
        assert_eq!(principal.role, Role::User);
    }

    #[test]
    fn test_unknown_subject_stays_unauthenticated() {
        let state = test_state();
        let token = state.jwt_handler.issue_access_token("ghost@x.com").unwrap();

        assert!(resolve_principal(&state, &headers_with(&format!("Bearer {}", token))).is_none());
    }

    #[test]
    fn test_expired_token_stays_unauthenticated() {
        let state = test_state();
        let token = state
            .jwt_handler
            .issue_token_at("a@x.com", Map::new(), Utc::now() - Duration::hours(48))
            .unwrap();

        assert!(resolve_principal(&state, &headers_with(&format!("Bearer {}", token))).is_none());
    }

    #[test]
    fn test_garbage_token_stays_unauthenticated() {
        let state = test_state();
        assert!(resolve_principal(&state, &headers_with("Bearer not-a-jwt")).is_none());
    }

    #[test]
    fn test_extract_principal_from_request() {
        let mut req = Request::new(Body::empty());
        assert!(extract_principal(&req).is_none());

        req.extensions_mut().insert(Principal {
            user_id: 1,
            email: "a@x.com".to_string(),
            role: Role::Admin,
        });

        let extracted = extract_principal(&req).unwrap();
        assert_eq!(extracted.email, "a@x.com");
        assert_eq!(extracted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_existing_principal_is_not_reauthenticated() {
        let mut req = axum::http::Request::builder()
            .uri("/whoami")
            .header(AUTHORIZATION, "Bearer junk")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(Principal {
            user_id: 99,
            email: "pre@x.com".to_string(),
            role: Role::Admin,
        });

        let response = whoami_router(test_state()).oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "pre@x.com");
    }

    #[tokio::test]
    async fn test_middleware_attaches_principal_for_valid_token() {
        let state = test_state();
        let token = state.jwt_handler.issue_access_token("a@x.com").unwrap();

        let req = axum::http::Request::builder()
            .uri("/whoami")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = whoami_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "a@x.com");

        let anonymous = axum::http::Request::builder()
            .uri("/whoami")
            .header(AUTHORIZATION, "Bearer junk")
            .body(Body::empty())
            .unwrap();
        let response = whoami_router(state).oneshot(anonymous).await.unwrap();
        assert_eq!(body_text(response).await, "anonymous");
    }
}
