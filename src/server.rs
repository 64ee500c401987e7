//! Server Bootstrap
//! Mission: Build shared state from configuration and serve the API

use crate::{
    auth::{AuthState, JwtHandler, PasswordHasher, UserStore},
    config::AppConfig,
    routes::create_router,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Open the store, seed the admin account if configured, and assemble the auth state
pub fn build_state(config: &AppConfig) -> Result<AuthState> {
    config.validate()?;

    let user_store = Arc::new(UserStore::open(&config.database_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(&config.jwt));
    let passwords = PasswordHasher::new(config.bcrypt_cost);

    if let Some(seed) = &config.admin_seed {
        let password_hash = passwords.hash(&seed.password)?;
        if user_store.ensure_admin(&seed.email, &password_hash)?.is_none() {
            info!("Admin account already present, seed skipped");
        }
    }

    Ok(AuthState::new(user_store, jwt_handler, passwords))
}

/// Serve until Ctrl-C
pub async fn run(config: AppConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = create_router(state, &config.cors_allowed_origin)?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
