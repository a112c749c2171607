//! Relaycast Server — real-time WebSocket broadcast relay.
//!
//! Main entry point that wires the crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use relaycast_api::router::build_router;
use relaycast_api::state::AppState;
use relaycast_core::config::AppConfig;
use relaycast_core::error::{AppError, ErrorKind};
use relaycast_relay::RelayEngine;

/// Command-line overrides for the file/environment configuration.
#[derive(Debug, Parser)]
#[command(
    name = "relaycast-server",
    version,
    about = "Real-time WebSocket broadcast relay"
)]
struct Cli {
    /// Configuration environment (selects config/<env>.toml)
    #[arg(long, env = "RELAYCAST_ENV", default_value = "development")]
    env: String,
    /// Override the bind address
    #[arg(long)]
    host: Option<String>,
    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
    /// Serve over TLS
    #[arg(long)]
    tls: bool,
    /// Path to the PEM certificate chain file (TLS mode)
    #[arg(long)]
    cert: Option<String>,
    /// Path to the PEM private key file (TLS mode)
    #[arg(long)]
    key: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment, then apply CLI overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&cli.env)?;

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.tls {
        config.server.tls.enabled = true;
    }
    if let Some(cert) = &cli.cert {
        config.server.tls.cert_path = cert.clone();
    }
    if let Some(key) = &cli.key {
        config.server.tls.key_path = key.clone();
    }

    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Relaycast v{}", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(RelayEngine::new(config.relay.clone()));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::configuration(format!("Invalid bind address: {e}")))?;

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::clone(&engine),
    };
    let app = build_router(state);

    if config.server.tls.enabled {
        serve_tls(addr, &config, app, engine).await
    } else {
        serve_plain(addr, app, engine).await
    }
}

/// Serve over a plain TCP listener with graceful shutdown.
async fn serve_plain(
    addr: SocketAddr,
    app: Router,
    engine: Arc<RelayEngine>,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Relaycast server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Relaycast server shut down gracefully");
    Ok(())
}

/// Serve over a TLS listener with graceful shutdown.
///
/// TLS setup problems are hard startup errors: a relay that cannot build
/// its handshake context serves nobody.
async fn serve_tls(
    addr: SocketAddr,
    config: &AppConfig,
    app: Router,
    engine: Arc<RelayEngine>,
) -> Result<(), AppError> {
    // Rustls 0.23+ requires a process-wide crypto provider; only the
    // first install wins.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls = &config.server.tls;
    if tls.cert_path.is_empty() || tls.key_path.is_empty() {
        return Err(AppError::configuration(
            "TLS enabled but cert_path/key_path not set",
        ));
    }

    let rustls_config =
        axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to load TLS material", e)
            })?;

    tracing::info!("Relaycast server listening on {} (TLS)", addr);

    let handle = axum_server::Handle::new();
    let signal_handle = handle.clone();
    let grace = config.server.shutdown_grace_seconds;
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        engine.shutdown();
        signal_handle.graceful_shutdown(Some(Duration::from_secs(grace)));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Relaycast server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
