//! ReviewLens Server
//!
//! Analyzes free-form review text for sentiment and sarcasm, persists each
//! analyzed review, and serves the review dashboard API.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

use reviewlens_server::{create_router, AppState, ConfigOverrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "reviewlens-server")]
#[command(about = "ReviewLens review sentiment and sarcasm analysis API", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "reviewlens.yaml", env = "REVIEWLENS_CONFIG")]
    config: PathBuf,

    /// Listen address
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "REVIEWLENS_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "REVIEWLENS_DATABASE")]
    database: Option<PathBuf>,

    /// Keep reviews in memory only
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Model registry YAML
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Use the builtin lexicon models instead of transformer weights
    #[arg(long)]
    builtin_models: bool,

    /// Upper bound on one scoring pass, in seconds
    #[arg(long)]
    inference_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen: self.listen.clone(),
            port: self.port,
            database: self.database.clone(),
            in_memory: self.in_memory,
            settings_path: self.settings.clone(),
            models_registry: self.models.clone(),
            builtin_models: self.builtin_models,
            inference_timeout_secs: self.inference_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting ReviewLens server");

    let config = ServerConfig::load(&cli.config, &cli.overrides())?;
    info!("Configuration loaded successfully");
    info!("Storage: {:?} ({})", config.storage.backend, config.storage.path.display());
    info!("Settings file: {}", config.settings_path.display());
    match config.inference.timeout() {
        Some(timeout) => info!("Inference timeout: {:?}", timeout),
        None => info!("Inference timeout: unbounded"),
    }

    let metrics_handle = init_metrics()?;

    info!("Initializing application state...");
    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let state = AppState::new(config, metrics_handle).await?;
    info!("Application state initialized successfully");

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("ReviewLens listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("reviewlens=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reviewlens=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "reviewlens_requests_total",
        "Total number of API requests by endpoint"
    );
    metrics::describe_counter!(
        "reviewlens_errors_total",
        "Total number of failed analyses by kind"
    );
    metrics::describe_histogram!(
        "reviewlens_analysis_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end analysis latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
