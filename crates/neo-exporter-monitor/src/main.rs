use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neo_monitor::{bootstrap, MonitorConfig};

/// Prometheus exporter for NeoFS network state.
#[derive(Parser, Debug)]
#[command(name = "neo-exporter", version, about)]
struct Args {
    /// Path to the YAML config file
    #[arg(long, short, value_name = "PATH", env = "NEO_EXPORTER_CONFIG")]
    config: Option<PathBuf>,
}

async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "can't listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("shutdown signal received");
    cancel.cancel();
}

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let loaded = MonitorConfig::load(args.config.as_deref());
    let fallback_filter = loaded
        .as_ref()
        .map(MonitorConfig::log_filter)
        .unwrap_or_else(|_| "info,actix_web=info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        fschain = config.chain.fschain,
        endpoints = ?config.chain.rpc.endpoint,
        "starting neo-exporter"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let monitor = match bootstrap::build(&config, &cancel).await {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!(error = %e, "can't initialize monitor");
            std::process::exit(1);
        }
    };

    if let Err(e) = monitor.run(cancel).await {
        tracing::error!(error = %e, "metrics server failed");
        std::process::exit(1);
    }
    tracing::info!("application stopped");
}
