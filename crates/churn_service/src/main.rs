//! Churn prediction service binary

use anyhow::{Context, Result};
use churn_service::{start_server, ConfigOverrides, ServiceConfig, ServiceContext};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "churn-service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve churn predictions over HTTP", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5000
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory holding stored models
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Model key: lr, rfc or xgbc
    #[arg(short, long)]
    model: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config
        .apply_overrides(ConfigOverrides {
            bind_addr: args.bind,
            model_dir: args.model_dir,
            model_key: args.model,
            log_level: args.log_level,
        })
        .context("Invalid command-line configuration")?;

    init_logging(&config)?;
    info!("Churn service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        model = %config.model_key,
        dir = %config.model_dir.display(),
        unknown_keys = %config.unknown_keys,
        unknown_categories = %config.unknown_categories,
        "starting"
    );

    let ctx = Arc::new(ServiceContext::load(&config));
    if !ctx.is_ready() {
        warn!(
            "serving without a model; prediction routes will return {}",
            config.unavailable_status
        );
    }

    start_server(ctx, &config.bind_addr).await?;
    info!("Churn service stopped");
    Ok(())
}

fn init_logging(config: &ServiceConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()
            .context("Failed to set tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("Failed to set tracing subscriber")?;
    }

    Ok(())
}
