//! Service Errors
//! Mission: One error taxonomy for every user-facing failure

use crate::auth::envelope::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use tracing::error;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    DuplicateEmail,
    BadCredentials,
    TokenInvalid,
    TokenExpired,
    Unauthenticated,
    Forbidden,
    InvalidRequest(String),
    Internal(anyhow::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::DuplicateEmail => StatusCode::CONFLICT,
            ServiceError::BadCredentials
            | ServiceError::TokenInvalid
            | ServiceError::TokenExpired
            | ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_not_found() -> Self {
        ServiceError::NotFound("User not found".to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(msg) => f.write_str(msg),
            ServiceError::DuplicateEmail => f.write_str("Email is already registered"),
            ServiceError::BadCredentials => f.write_str("Invalid email or password"),
            ServiceError::TokenInvalid => f.write_str("Invalid token"),
            ServiceError::TokenExpired => f.write_str("Token has expired"),
            ServiceError::Unauthenticated => f.write_str("Authentication required"),
            ServiceError::Forbidden => f.write_str("Insufficient permissions"),
            ServiceError::InvalidRequest(msg) => f.write_str(msg),
            // Internal detail stays in the logs
            ServiceError::Internal(_) => f.write_str("Internal server error"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(err)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Internal(err.into())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(err) = &self {
            error!("Internal error: {:#}", err);
        }

        let status = self.status();
        let body = Envelope::error(status, self.to_string());

        (status, Json(body)).into_response()
    }
}
