//! CLI module for the forwarder.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ForwardConfig;
use crate::forward::Forwarder;

/// CLI arguments for the forwarder.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sockpipe-forward",
    version,
    about = "Forward TCP connections to a target, relaying bytes both ways"
)]
pub struct ForwardArgs {
    /// Config file path (toml).
    #[arg(short, long, default_value = "forward.toml", conflicts_with = "listen")]
    pub config: PathBuf,

    /// Listen address for a single ad-hoc rule (requires --target).
    #[arg(long, requires = "target")]
    pub listen: Option<SocketAddr>,

    /// Target host:port for a single ad-hoc rule (requires --listen).
    #[arg(long, requires = "listen")]
    pub target: Option<String>,

    /// Print a diagnostic line for every relay event.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level override (e.g. "info", "debug", "trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ForwardArgs {
    /// Build the effective config: ad-hoc rule or config file, plus overrides.
    pub fn to_config(&self) -> Result<ForwardConfig, crate::error::ConfigError> {
        let mut config = match (self.listen, &self.target) {
            (Some(listen), Some(target)) => ForwardConfig::single(listen, target.clone()),
            _ => ForwardConfig::load(&self.config)?,
        };
        if self.verbose {
            config.verbose = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the forwarder with the given CLI arguments.
pub async fn run(args: ForwardArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config()?;

    init_tracing(args.log_level.as_deref());
    info!(
        version = sockpipe_core::VERSION,
        rules = config.rules.len(),
        "{} forwarder starting",
        sockpipe_core::PROJECT_NAME
    );

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    let forwarder = Forwarder::bind(config).await?;
    forwarder
        .run(shutdown)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(level: Option<&str>) {
    let level = level.unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
