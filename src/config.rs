//! Service Configuration
//! Mission: Hold every process-wide setting in one explicit value

use anyhow::{bail, Result};
use chrono::Duration;
use std::fmt;
use std::net::SocketAddr;

/// Minimum accepted HMAC secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Accepted bcrypt work factors
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;

/// Fallback secret for local development only
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Token signing configuration, handed to the token service at construction
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Result<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            bail!(
                "JWT secret must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                secret.len()
            );
        }
        if expiration_hours <= 0 {
            bail!("JWT expiration must be positive (got {}h)", expiration_hours);
        }
        let Some(expiration) = Duration::try_hours(expiration_hours) else {
            bail!("JWT expiration out of range (got {}h)", expiration_hours);
        };

        Ok(Self { secret, expiration })
    }

    /// Human-readable lifetime label returned to clients, e.g. "24Hrs"
    pub fn expiration_label(&self) -> String {
        format!("{}Hrs", self.expiration.num_hours())
    }
}

/// Seed account created on startup when no ADMIN exists yet
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub cors_allowed_origin: String,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&self.bcrypt_cost) {
            bail!(
                "bcrypt cost must be within {}..={} (got {})",
                BCRYPT_MIN_COST,
                BCRYPT_MAX_COST,
                self.bcrypt_cost
            );
        }
        if self.cors_allowed_origin.trim().is_empty() {
            bail!("CORS allowed origin must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            database_path: ":memory:".to_string(),
            jwt: JwtConfig::new(DEV_JWT_SECRET, 24).unwrap(),
            bcrypt_cost: 4,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            admin_seed: None,
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtConfig::new("too-short", 24).is_err());
    }

    #[test]
    fn test_non_positive_expiration_rejected() {
        assert!(JwtConfig::new(DEV_JWT_SECRET, 0).is_err());
        assert!(JwtConfig::new(DEV_JWT_SECRET, -3).is_err());
    }

    #[test]
    fn test_oversized_expiration_rejected() {
        let err = JwtConfig::new(DEV_JWT_SECRET, i64::MAX / 1000).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_expiration_label() {
        let jwt = JwtConfig::new(DEV_JWT_SECRET, 24).unwrap();
        assert_eq!(jwt.expiration_label(), "24Hrs");
        assert_eq!(jwt.expiration, Duration::hours(24));
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let mut config = sample_config();
        config.admin_seed = Some(AdminSeed {
            email: "root@x.com".to_string(),
            password: "hunter2".to_string(),
        });

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(DEV_JWT_SECRET));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("root@x.com"));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.bcrypt_cost = 3;
        assert!(config.validate().is_err());

        config.bcrypt_cost = 32;
        assert!(config.validate().is_err());
    }
}
