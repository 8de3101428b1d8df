use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use festflow_api::config::{DataConfig, ServerConfig};
use festflow_api::loader::load_snapshot;
use festflow_api::router::build_app_router;
use festflow_api::state::{AppState, DatasetStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "festflow_api=debug,festflow_sources=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let data_config = DataConfig::from_env();
    let pipeline_config = data_config
        .pipeline_config()
        .expect("Invalid pipeline configuration");
    tracing::info!(
        preset = ?data_config.preset,
        events = %data_config.events_path.display(),
        stops = ?data_config.stops,
        radius_m = pipeline_config.stop_radius_m,
        "Loaded data configuration"
    );

    // --- Dataset ---
    let snapshot = load_snapshot(&data_config, &pipeline_config)
        .await
        .expect("Failed to load initial dataset");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        data_config: Arc::new(data_config),
        pipeline_config: Arc::new(pipeline_config),
        store: Arc::new(DatasetStore::new(snapshot)),
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

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
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
