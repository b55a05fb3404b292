use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ecom_api::config::ServerConfig;
use ecom_api::notifications::{EmailConfig, EmailNotifier, LogNotifier};
use ecom_api::router::build_app_router;
use ecom_api::state::AppState;
use ecom_core::auth::ports::SignupNotifier;
use ecom_core::auth::SessionManager;
use ecom_db::{PgSessionLedger, PgUserStore};
use ecom_identity::{GoTrueClient, GoTrueConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecom_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = ecom_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    ecom_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    ecom_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Identity provider ---
    let identity = GoTrueClient::new(GoTrueConfig::from_env());
    match identity.health().await {
        Ok(()) => tracing::info!(base_url = %identity.config().base_url, "Identity provider reachable"),
        Err(e) => tracing::warn!(error = %e, "Identity provider health check failed"),
    }
    if identity.config().service_role_key.is_none() {
        tracing::warn!("SUPABASE_SERVICE_ROLE_KEY not set, failed signups cannot be rolled back");
    }

    // --- Signup notifications ---
    let notifier: Arc<dyn SignupNotifier> = match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(smtp_host = %email.smtp_host, "SMTP signup notifications enabled");
            Arc::new(EmailNotifier::new(email))
        }
        None => Arc::new(LogNotifier),
    };

    // --- Session manager ---
    let sessions = Arc::new(SessionManager::new(
        Arc::new(identity),
        Arc::new(PgSessionLedger::new(pool.clone())),
        Arc::new(PgUserStore::new(pool.clone())),
        notifier,
        config.session_settings(),
    ));

    // --- Background jobs ---
    let retention_cancel = tokio_util::sync::CancellationToken::new();
    let retention_handle = tokio::spawn(ecom_api::background::session_retention::run(
        pool.clone(),
        Duration::from_secs(config.session_cleanup_interval_secs),
        config.revoked_session_retention_hours,
        retention_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        retention_handle,
    )
    .await;
    tracing::info!("Session retention job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
