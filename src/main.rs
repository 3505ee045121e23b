//! Textile Negotiation Platform - API Server
//! Mission: Authenticate buyers, manufacturers and admins, publish fabric
//! listings and broker negotiations through the MPSO optimizer

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use textile_negotiation::{
    auth::{JwtHandler, UserStore},
    config::Config,
    create_router, db,
    middleware::RateLimitLayer,
    negotiation::OptimizerClient,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🧵 Textile negotiation backend starting");
    debug!(db_path = %config.db_path, optimizer = %config.optimizer_base_url, "Loaded configuration");

    // Database
    let conn = db::open(&config.db_path)?;

    // Authentication
    let users = UserStore::new(conn.clone()).context("Failed to initialize user store")?;
    if let Some((email, password)) = config.bootstrap_admin() {
        if !users.ensure_admin(email, password)? {
            debug!("Bootstrap admin already present");
        }
    }
    let jwt = JwtHandler::with_expiration(config.resolve_jwt_secret()?, config.jwt_expiration_hours);
    info!("🔐 JWT tokens valid for {} hours", jwt.expiration_hours());

    // Optimizer
    let optimizer = OptimizerClient::new(&config.optimizer_base_url, config.optimizer_timeout())?;
    info!("🐝 Optimizer service at {}", optimizer.base_url());

    let state = AppState::new(conn, users, jwt, Arc::new(optimizer), config.cookie_secure)?;

    // Login throttling plus periodic cleanup of idle clients
    let login_limiter = RateLimitLayer::new(config.login_limiter_config());
    let cleanup_limiter = login_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            let removed = cleanup_limiter.cleanup();
            if removed > 0 {
                debug!(removed, "Rate limiter cleanup");
            }
        }
    });

    let app = create_router(state, login_limiter);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textile_negotiation=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
