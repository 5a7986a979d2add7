//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod shutdown;

use anyhow::Context;
use axum::Router;
use coordinator::{
    CoordinatorAppState, CoordinatorConfig, DeviceRepository, MemoryDeviceRepository, MinerId,
    PgDeviceRepository, coordinator_router_generic,
};
use kernel::clock::{Clock, SystemClock};
use reputation::{
    MemoryMinerRepository, MinerRepository, PgMinerRepository, ReputationConfig,
    reputation_router_generic, with_ban_filter,
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,coordinator=info,reputation=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = env::var("LISTEN_ADDR")
        .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
        .parse()
        .context("LISTEN_ADDR must be a socket address")?;

    let config = Arc::new(CoordinatorConfig::from_vars(|key| env::var(key).ok()));
    tracing::info!(
        bot = ?config.bot_identity.as_ref().map(MinerId::as_str),
        priority = config.identity_priority.len(),
        msed_dir = %config.msed_dir.display(),
        "Coordinator configured"
    );
    let reputation_config = ReputationConfig::default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shutdown = shutdown::install_shutdown_handler();

    let store = env::var("STORE").unwrap_or_else(|_| "postgres".to_string());
    let (app, reconciler) = match store.as_str() {
        "postgres" => {
            let database_url =
                env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            build_app(
                PgDeviceRepository::new(pool.clone()),
                PgMinerRepository::new(pool),
                config,
                reputation_config,
                clock,
                shutdown.clone(),
            )
        }
        "memory" => {
            tracing::warn!("Using the in-memory store, state is lost on restart");
            build_app(
                MemoryDeviceRepository::new(),
                MemoryMinerRepository::new(),
                config,
                reputation_config,
                clock,
                shutdown.clone(),
            )
        }
        other => anyhow::bail!("STORE must be postgres or memory, got {other:?}"),
    };

    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
    .await?;

    // The server can also stop on its own
    shutdown.cancel();
    if let Err(e) = reconciler.await {
        tracing::error!(error = %e, "Reconciliation task failed");
    }

    tracing::info!("Server stopped");

    Ok(())
}

/// Assemble the routers over one pair of stores and start the reconciliation
/// loop
fn build_app<R, M>(
    devices: R,
    miners: M,
    config: Arc<CoordinatorConfig>,
    reputation_config: ReputationConfig,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) -> (Router, JoinHandle<()>)
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let miners_arc = Arc::new(miners.clone());
    let state = CoordinatorAppState::new(
        Arc::new(devices),
        miners_arc.clone(),
        Arc::new(reputation_config.clone()),
        config,
        clock,
    );

    let reconciler = tokio::spawn(state.reconciler().run(shutdown));

    let app = Router::new()
        .merge(coordinator_router_generic(state))
        .merge(reputation_router_generic(miners, reputation_config));

    (with_ban_filter(app, miners_arc), reconciler)
}
