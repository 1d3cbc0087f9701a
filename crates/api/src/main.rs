use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interpret_api::config::{LogFormat, ServerConfig};
use interpret_api::router::build_app_router;
use interpret_api::state::AppState;
use interpret_cloud::{CloudClients, CloudConfig};
use interpret_core::pipeline::Interpreter;
use interpret_core::providers::ObjectStore;

const DEFAULT_LOG_FILTER: &str =
    "interpret_api=debug,interpret_core=debug,interpret_cloud=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    init_tracing(log_format);

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        languages = config.interpret.view.languages().len(),
        threshold = config.interpret.policy.threshold(),
        "Loaded server configuration"
    );

    let cloud = CloudConfig::from_env().expect("Invalid cloud configuration");
    let bucket = cloud
        .require_bucket()
        .expect("CLOUD_STORAGE_BUCKET must be set")
        .to_string();

    // --- Cloud clients ---
    let clients = CloudClients::from_config(&cloud).expect("Failed to build HTTP client");
    let store: Arc<dyn ObjectStore> = Arc::new(clients.storage(&cloud, &bucket));
    tracing::info!(%bucket, "Cloud clients ready");

    let interpreter = Interpreter::new(
        Arc::new(clients.vision),
        Arc::new(clients.translate),
        Arc::new(clients.links),
        config.interpret.policy.clone(),
        config.interpret.view.clone(),
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        interpreter: Arc::new(interpreter),
    };

    // --- Router ---
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

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
