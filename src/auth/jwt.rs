//! JWT Token Handler
//! Mission: Issue and verify signed, time-bound access and refresh tokens
//!
//! Access and refresh tokens share one HMAC key and there is no revocation
//! list: a token stays usable until its `exp` passes.
//!
//! Refresh tokens carry `token_type = "refresh"`. The claim is informational
//! for clients and log readers; verification never looks at it, so either
//! token kind is accepted wherever a signed, unexpired token is required.

use crate::{auth::error::ServiceError, config::JwtConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Claim names owned by the handler; caller-supplied extras cannot override them
const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

pub const TOKEN_TYPE_CLAIM: &str = "token_type";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // subject (user email)
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Access + refresh token pair handed out at login and refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
    expiration_label: String,
}

impl JwtHandler {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiration: config.expiration,
            expiration_label: config.expiration_label(),
        }
    }

    pub fn expiration_label(&self) -> &str {
        &self.expiration_label
    }

    pub fn issue_access_token(&self, subject: &str) -> Result<String> {
        self.issue_token_at(subject, Map::new(), Utc::now())
    }

    /// Refresh tokens carry `token_type = "refresh"` plus the caller's claims
    pub fn issue_refresh_token(&self, subject: &str, mut extra: Map<String, Value>) -> Result<String> {
        extra.insert(
            TOKEN_TYPE_CLAIM.to_string(),
            Value::String(REFRESH_TOKEN_TYPE.to_string()),
        );
        self.issue_token_at(subject, extra, Utc::now())
    }

    pub fn issue_pair(&self, subject: &str, refresh_claims: Map<String, Value>) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject)?,
            refresh_token: self.issue_refresh_token(subject, refresh_claims)?,
        })
    }

    /// Issue a token against an explicit clock
    pub fn issue_token_at(
        &self,
        subject: &str,
        mut extra: Map<String, Value>,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        extra.retain(|k, _| !RESERVED_CLAIMS.contains(&k.as_str()));

        let expires_at = issued_at
            .checked_add_signed(self.expiration)
            .context("Invalid timestamp")?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        };

        debug!("Issuing JWT for {}, expires at {}", subject, expires_at);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// Check signature and shape only; expiry is judged separately
    fn decode_claims(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected JWT: {}", e);
                ServiceError::TokenInvalid
            })
    }

    /// Subject of a correctly signed token, whether or not it has expired
    pub fn extract_subject(&self, token: &str) -> Result<String, ServiceError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Unverifiable tokens count as expired
    pub fn is_expired(&self, token: &str) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.decode_claims(token)
            .map(|claims| claims.is_expired_at(now))
            .unwrap_or(true)
    }

    /// True iff the signature checks out, the subject matches and `exp` is in the future
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        self.is_valid_at(token, expected_subject, Utc::now())
    }

    pub fn is_valid_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => claims.sub == expected_subject && !claims.is_expired_at(now),
            Err(_) => false,
        }
    }

    /// Full verification, telling an elapsed token apart from a bad one
    pub fn verify(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => {
                    debug!("Rejected JWT: {}", e);
                    ServiceError::TokenInvalid
                }
            })?;

        // jsonwebtoken accepts exp == now; tokens are valid strictly before exp
        if claims.is_expired_at(Utc::now()) {
            return Err(ServiceError::TokenExpired);
        }

        Ok(claims)
    }
}
