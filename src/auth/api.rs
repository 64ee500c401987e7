//! Authentication API Endpoints
//! Mission: Registration, login, token refresh and admin user management

use crate::auth::{
    envelope::Envelope,
    error::ServiceError,
    jwt::{JwtHandler, TokenPair},
    models::{NewUser, Principal, Role, User, UserUpdate},
    password::PasswordHasher,
    user_store::UserStore,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub passwords: PasswordHasher,
}

impl AuthState {
    pub fn new(
        user_store: Arc<UserStore>,
        jwt_handler: Arc<JwtHandler>,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            user_store,
            jwt_handler,
            passwords,
        }
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair, ServiceError> {
        let mut refresh_claims = Map::new();
        refresh_claims.insert("role".to_string(), Value::String(user.role.as_str().to_string()));

        Ok(self.jwt_handler.issue_pair(&user.email, refresh_claims)?)
    }

    fn token_response(&self, user: &User, tokens: TokenPair, message: &str) -> Envelope {
        Envelope {
            token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            expiration_time: Some(self.jwt_handler.expiration_label().to_string()),
            role: Some(user.role),
            ..Envelope::ok(message)
        }
    }
}

type ApiResult = Result<Json<Envelope>, ServiceError>;

/// Register - POST /auth/register
///
/// Creating an ADMIN account requires an authenticated ADMIN caller; seed the
/// first admin through configuration.
pub async fn register(
    State(state): State<AuthState>,
    caller: Option<Extension<Principal>>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> ApiResult {
    let req = parse_body(payload)?;
    let email = required(&req.email, "email")?;
    let password = required_password(&req.password)?;
    let name = required(&req.name, "name")?;
    let role = req.role.unwrap_or_default();

    if role == Role::Admin {
        let caller_is_admin = caller.is_some_and(|Extension(p)| p.role == Role::Admin);
        if !caller_is_admin {
            warn!("Rejected ADMIN self-registration for {}", email);
            return Err(ServiceError::Forbidden);
        }
    }

    let password_hash = state.passwords.hash(password)?;
    let user = state.user_store.create_user(&NewUser {
        email: email.to_string(),
        name: name.to_string(),
        city: Envelope::field(&req.city).map(str::to_string),
        role,
        password_hash,
    })?;

    info!("✅ Registered {} ({})", user.email, user.role);
    Ok(Json(Envelope::ok("User Saved Successfully").with_user(user)))
}

/// Login - POST /auth/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> ApiResult {
    let req = parse_body(payload)?;
    let email = required(&req.email, "email")?;
    let password = required_password(&req.password)?;

    info!("🔐 Login attempt: {}", email);

    let user = state
        .user_store
        .find_by_email(email)?
        .ok_or_else(ServiceError::user_not_found)?;

    if !state.passwords.verify(password, &user.password_hash)? {
        warn!("❌ Failed login attempt: {}", email);
        return Err(ServiceError::BadCredentials);
    }

    let tokens = state.issue_tokens(&user)?;
    info!("✅ Login successful: {} ({})", user.email, user.role);

    Ok(Json(state.token_response(&user, tokens, "Successfully Logged In")))
}

/// Refresh - POST /auth/refresh
///
/// The refresh token is read from `refreshToken`, falling back to `token`.
pub async fn refresh(
    State(state): State<AuthState>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> ApiResult {
    let req = parse_body(payload)?;
    let token = Envelope::field(&req.refresh_token)
        .or_else(|| Envelope::field(&req.token))
        .ok_or_else(|| ServiceError::InvalidRequest("refreshToken is required".to_string()))?;

    let claims = state.jwt_handler.verify(token)?;
    let user = state
        .user_store
        .find_by_email(&claims.sub)?
        .ok_or_else(ServiceError::user_not_found)?;

    let tokens = state.issue_tokens(&user)?;
    info!("🔄 Refreshed tokens for {}", user.email);

    Ok(Json(state.token_response(&user, tokens, "Successfully Refreshed Token")))
}

/// List all users - GET /admin/get-all-users
pub async fn list_users(State(state): State<AuthState>) -> ApiResult {
    let users = state.user_store.list_users()?;
    let message = if users.is_empty() {
        "No users found"
    } else {
        "Successful"
    };

    Ok(Json(Envelope::ok(message).with_users(users)))
}

/// Get user - GET /admin/get-user/:id
pub async fn get_user(
    State(state): State<AuthState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let id = parse_id(path)?;
    let user = state
        .user_store
        .find_by_id(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("User with id {} not found", id)))?;

    Ok(Json(Envelope::ok("User found successfully").with_user(user)))
}

/// Update user - PUT /admin/update/:id
///
/// Only supplied fields change; the password is re-hashed only when present.
pub async fn update_user(
    State(state): State<AuthState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(path)?;
    let req = parse_body(payload)?;

    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(state.passwords.hash(password)?),
        None => None,
    };

    let update = UserUpdate {
        email: Envelope::field(&req.email).map(str::to_string),
        name: Envelope::field(&req.name).map(str::to_string),
        city: Envelope::field(&req.city).map(str::to_string),
        role: req.role,
        password_hash,
    };

    let user = state.user_store.update_user(id, update)?;
    Ok(Json(Envelope::ok("User updated successfully").with_user(user)))
}

/// Delete user - DELETE /admin/delete/:id
pub async fn delete_user(
    State(state): State<AuthState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let id = parse_id(path)?;
    state.user_store.delete_user(id)?;

    info!("🗑️  User deleted: {}", id);
    Ok(Json(Envelope::ok("User deleted successfully")))
}

/// Own profile - GET /adminuser/get-profile
///
/// Looks up the caller's own identity; nothing the client sends selects the user.
pub async fn get_profile(
    State(state): State<AuthState>,
    caller: Option<Extension<Principal>>,
) -> ApiResult {
    let Extension(principal) = caller.ok_or(ServiceError::Unauthenticated)?;

    let user = state
        .user_store
        .find_by_email(&principal.email)?
        .ok_or_else(ServiceError::user_not_found)?;
    debug!("Profile lookup for id={}", principal.user_id);

    Ok(Json(Envelope::ok("Successful").with_user(user)))
}

fn parse_body(payload: Result<Json<Envelope>, JsonRejection>) -> Result<Envelope, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::InvalidRequest(rejection.body_text()))
}

fn parse_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ServiceError> {
    path.map(|Path(id)| id)
        .map_err(|_| ServiceError::InvalidRequest("User id must be an integer".to_string()))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ServiceError> {
    Envelope::field(value)
        .ok_or_else(|| ServiceError::InvalidRequest(format!("{} is required", field)))
}

// Passwords are taken verbatim, surrounding whitespace included
fn required_password(value: &Option<String>) -> Result<&str, ServiceError> {
    value
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServiceError::InvalidRequest("password is required".to_string()))
}
