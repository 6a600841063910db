use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubedrop_core::{
    load_config, validate_config, DownloadOrchestrator, FileDelivery, JobRegistry, SourceFetcher,
    YtDlpFetcher,
};

use tubedrop_server::api::create_router;
use tubedrop_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TUBEDROP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Fetch tool: {:?}", config.fetcher.yt_dlp_path);

    // Provision the scratch directory for artifacts
    tokio::fs::create_dir_all(&config.downloads.dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create downloads directory {:?}",
                config.downloads.dir
            )
        })?;
    info!("Downloads directory: {:?}", config.downloads.dir);

    // Create the fetcher and check the external tool is reachable.
    // A missing tool is not fatal at startup: jobs fail individually with a
    // spawn failure, observable via the progress endpoint.
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(YtDlpFetcher::new(config.fetcher.clone()));
    match fetcher.validate().await {
        Ok(()) => info!("Fetch tool validated"),
        Err(e) => warn!("Fetch tool validation failed: {}", e),
    }

    // Create the job registry, orchestrator and delivery front-end
    let registry = Arc::new(JobRegistry::new());
    let orchestrator = Arc::new(DownloadOrchestrator::new(
        config.downloads.clone(),
        Arc::clone(&registry),
        fetcher,
    ));
    let delivery = Arc::new(FileDelivery::new(Arc::clone(&registry)));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        registry,
        Arc::clone(&orchestrator),
        delivery,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Cancel in-flight jobs so no orphaned tool processes survive us
    info!("Server shutting down...");
    orchestrator.stop().await;
    info!("Orchestrator stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
