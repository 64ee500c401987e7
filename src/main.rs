//! User Management Backend
//!
//! Usage:
//!   usermgmt --bind-addr 0.0.0.0:8080 --db-path users.db
//!
//! Environment:
//!   BIND_ADDR - Listen address (default: 0.0.0.0:8080)
//!   AUTH_DB_PATH - SQLite file; relative paths resolve against the crate dir
//!   JWT_SECRET - HMAC signing secret, at least 32 bytes
//!   JWT_EXPIRATION_HOURS - Access/refresh token lifetime (default: 24)
//!   BCRYPT_COST - Password hashing work factor (default: 12)
//!   CORS_ALLOWED_ORIGIN - Browser origin allowed to call the API
//!   ADMIN_EMAIL / ADMIN_PASSWORD - Seed an ADMIN account when none exists

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usermgmt_backend::{
    config::{AdminSeed, AppConfig, JwtConfig, DEV_JWT_SECRET},
    server,
};

#[derive(Parser, Debug)]
#[command(name = "usermgmt")]
#[command(about = "User management API with bearer-token auth")]
struct Args {
    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: SocketAddr,

    /// SQLite database path
    #[arg(long, env = "AUTH_DB_PATH", default_value = "users.db")]
    db_path: String,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_EXPIRATION_HOURS", default_value = "24")]
    jwt_expiration_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    bcrypt_cost: u32,

    /// Allowed CORS origin
    #[arg(long, env = "CORS_ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    cors_allowed_origin: String,

    /// Email of the seeded admin account
    #[arg(long, env = "ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Password of the seeded admin account
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<AppConfig> {
        let secret = match self.jwt_secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("⚠️  JWT_SECRET not set, using development secret. CHANGE IN PRODUCTION!");
                DEV_JWT_SECRET.to_string()
            }
        };

        let admin_seed = match (self.admin_email, self.admin_password) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => {
                warn!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together, admin seed skipped");
                None
            }
        };

        Ok(AppConfig {
            bind_addr: self.bind_addr,
            database_path: resolve_data_path(&self.db_path),
            jwt: JwtConfig::new(secret, self.jwt_expiration_hours)?,
            bcrypt_cost: self.bcrypt_cost,
            cors_allowed_origin: self.cors_allowed_origin,
            admin_seed,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Args::parse().into_config()?;

    info!("🚀 User management backend starting");
    info!("  Database: {}", config.database_path);
    info!("  Token lifetime: {}", config.jwt.expiration_label());
    info!("  CORS origin: {}", config.cors_allowed_origin);

    server::run(config).await
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "usermgmt_backend=debug,usermgmt=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_data_path(raw: &str) -> String {
    if raw == ":memory:" {
        return raw.to_string();
    }

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    // Relative to the crate dir, not the caller's cwd
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(p)
        .to_string_lossy()
        .to_string()
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate dir (when running with --manifest-path from elsewhere)
    let env_file = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if env_file.exists() {
        let _ = dotenv::from_path(&env_file);
    }
}
