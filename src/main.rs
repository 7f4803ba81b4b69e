//! Roster API - user directory and credential service
//!
//! Authenticates principals, issues short-lived signed identity tokens,
//! and manages a user directory with role-gated mutation rules and a
//! soft-delete lifecycle. Storage sits behind an abstract repository;
//! this binary wires the in-memory implementation.

mod auth;
mod config;
mod directory;
mod error;
mod repository;
mod routes;
mod state;
mod user;

use crate::config::Settings;
use crate::directory::UserDirectory;
use crate::repository::MemoryUserRepository;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("Starting Roster - user directory and credential service...");

    // Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    // Wire the directory against its repository
    let repository = Arc::new(MemoryUserRepository::new());
    let directory = UserDirectory::new(repository);

    // Seed the bootstrap administrator exactly once, before serving
    directory.ensure_admin_exists().await.map_err(|e| {
        anyhow::anyhow!("Failed to seed the bootstrap administrator: {}", e)
    })?;

    let state = Arc::new(AppState::new(directory, settings.jwt.secret.clone()));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   POST   /api/auth/login               - Authenticate, receive access token");
    info!("   POST   /api/users/me                 - Own full record (password re-check)");
    info!("   POST   /api/users                    - Create user (admin)");
    info!("   GET    /api/users                    - List active users (admin)");
    info!("   GET    /api/users/:login             - Get user by login (admin)");
    info!("   PATCH  /api/users/:login             - Update name/gender/birthday");
    info!("   PUT    /api/users/:login/password    - Change password");
    info!("   PUT    /api/users/:login/login       - Rename login");
    info!("   GET    /api/users/older-than/:age    - Users older than age (admin)");
    info!("   DELETE /api/users/:login?soft=bool   - Revoke or permanently delete (admin)");
    info!("   POST   /api/users/:login/restore     - Restore a revoked user (admin)");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roster_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
