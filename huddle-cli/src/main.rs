use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use huddle_server::{
    AppState, ConnectionRegistry, RelayConfig, RoomStore, SignalingService, TracingObserver,
    router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "huddle", version, about = "WebRTC signaling relay")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "HUDDLE_CONFIG", default_value = "huddle.toml")]
    config: PathBuf,

    /// Override `http.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override `logging.level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = RelayConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, &config.logging.format);

    if !found {
        warn!(
            path = %args.config.display(),
            "Config file not found, using defaults"
        );
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "Initializing huddle"
    );

    let store = Arc::new(RoomStore::new());
    let registry = ConnectionRegistry::new(Arc::new(TracingObserver))
        .with_delivery_timeout(config.signaling.delivery_timeout());
    let service = SignalingService::new(store, registry, config.signaling.clone());

    let app = router(AppState::new(service.clone(), config.websocket.clone()));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!(
        "{} {}",
        "huddle listening on".green().bold(),
        format!("http://{addr}").cyan()
    );
    info!("Signaling server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(service))
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => fmt().json().with_env_filter(filter).with_target(true).init(),
        _ => fmt().with_env_filter(filter).with_target(true).init(),
    }
}

/// Resolves on Ctrl-C or SIGTERM after telling every connection loop to stop.
async fn shutdown_signal(service: SignalingService) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
    service.shutdown();
}
