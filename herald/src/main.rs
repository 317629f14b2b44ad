mod console;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use herald_core::{logging, Config, MessageQueue, SubscriberSession};

/// Leader-aware pub/sub subscriber
#[derive(Debug, Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "HERALD_CONFIG_PATH")]
    config: Option<String>,

    /// HTTP port, also used for the default callback address
    #[arg(short, long)]
    port: Option<u16>,

    /// Run the interactive console on stdin
    #[arg(long)]
    console: bool,
}

/// Load configuration from a config file or environment variables
///
/// Config file search order:
/// 1. `--config` / HERALD_CONFIG_PATH (explicit path)
/// 2. ./herald.yaml (current working directory)
/// 3. Fall back to environment variables only
fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = explicit
        .map(str::to_string)
        .filter(|p| Path::new(p).exists())
        .or_else(|| {
            let cwd = "herald.yaml";
            Path::new(cwd).exists().then(|| cwd.to_string())
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)?
    } else {
        if let Some(path) = explicit {
            eprintln!("Config file {path} not found, using environment variables");
        }
        Config::from_env()?
    };

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load and validate configuration (fail fast on misconfigurations)
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;

    // 3. Build the session
    let session = Arc::new(SubscriberSession::from_config(&config)?);
    info!(
        subscriber_id = session.identity().id(),
        callback_url = %session.identity().callback_url(),
        coordinator = %config.coordinator.url,
        "Subscriber started"
    );

    // 4. Bind the callback listener before the broker learns our address
    let http_address = config.http_address();
    let listener = tokio::net::TcpListener::bind(&http_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}"))?;
    info!("HTTP server listening on {}", http_address);

    let messages = Arc::new(MessageQueue::new(config.subscriber.max_buffered_messages));
    let router = herald_api::create_router(session.clone(), messages);

    // 5. Serve the callback and control endpoints
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let http_handle = tokio::spawn(async move {
        let graceful = async move {
            let _ = shutdown_rx.changed().await;
        };
        if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(graceful).await {
            error!("HTTP server error: {}", e);
        }
        info!("HTTP server shut down gracefully");
    });

    // 6. Resolve the leader and register (non-fatal: operations retry on demand)
    if let Err(e) = session.initialize().await {
        warn!(error = %e, "Initial registration failed, will retry on first operation");
    }

    // 7. Optional console; leaving it does not stop the server
    if cli.console {
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(e) = console::run(session).await {
                error!("Console error: {}", e);
            }
        });
    }

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = http_handle.await {
        error!("HTTP server task failed: {}", e);
    }

    info!("Subscriber shut down complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
