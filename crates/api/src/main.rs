//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::{AppState, create_app};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryPickupPointStore, PickupPointStore, PostgresPickupPointStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_app<S: PickupPointStore + Clone + 'static>(
    store: S,
    config: &Config,
    metrics_handle: PrometheusHandle,
) -> Router {
    let state = Arc::new(AppState::new(store, config.store_timeout));
    create_app(state, metrics_handle)
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env().expect("invalid configuration");
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Select the store and build the application
    let app = match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresPickupPointStore::connect(url, config.database_max_connections)
                .await
                .expect("failed to connect to PostgreSQL");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL store");
            build_app(store, &config, metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            build_app(InMemoryPickupPointStore::new(), &config, metrics_handle)
        }
    };

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, store_timeout = ?config.store_timeout, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
