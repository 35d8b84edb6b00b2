//! ObjectIO Init - Disk bootstrap
//!
//! Brings every configured disk into a usable state: creates the
//! metadata volume and purges temporary objects left over from an
//! interrupted run. Exits non-zero if any disk could not be prepared.

use anyhow::{Context, Result, bail};
use clap::Parser;
use objectio_bootstrap::{MetaLayout, init_object_layer};
use objectio_common::Config;
use objectio_common::config::{DiskConfig, LogFormat};
use objectio_storage::{DiskStore, LocalDisk};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "objectio-init")]
#[command(about = "Prepare ObjectIO disks for serving")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/objectio/init.toml")]
    config: String,

    /// Disk root directories, in order (overrides the config file)
    #[arg(long)]
    disks: Vec<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (text or json)
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

fn parse_log_format(s: &str) -> std::result::Result<LogFormat, String> {
    match s {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format: {other}")),
    }
}

/// Load the config file if present; CLI flags take precedence
fn load_config(args: &Args) -> Result<Config> {
    let mut config: Config = if Path::new(&args.config).exists() {
        let config_str = std::fs::read_to_string(&args.config)
            .with_context(|| format!("reading {}", args.config))?;
        toml::from_str(&config_str).with_context(|| format!("parsing {}", args.config))?
    } else {
        Config::default()
    };

    if !args.disks.is_empty() {
        config.storage.disks = args.disks.iter().map(|d| DiskConfig::from(d.as_str())).collect();
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());
    let json = config.logging.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn open_disks(config: &Config) -> Result<Vec<DiskStore>> {
    let mut disks: Vec<DiskStore> = Vec::with_capacity(config.storage.disks.len());
    for (index, disk) in config.storage.disks.iter().enumerate() {
        let local = LocalDisk::new(&disk.path)
            .await
            .with_context(|| format!("opening disk {index} at {}", disk.path.display()))?;
        disks.push(Arc::new(local));
    }
    Ok(disks)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(&config);

    info!("Starting ObjectIO disk bootstrap");
    info!("Config file: {}", args.config);
    info!("Node: {}", config.node.name);

    if let Err(e) = config.validate() {
        error!("{e}. Use --disks or configure in {}", args.config);
        bail!(e);
    }

    let disks = open_disks(&config).await?;
    let layout = MetaLayout::from(&config.storage);
    info!(
        "Initializing {} disks (volume {}, temporary prefix {})",
        disks.len(),
        layout.volume,
        layout.tmp_prefix
    );

    if let Err(e) = init_object_layer(&disks, &layout).await {
        if e.is_retryable() {
            warn!("Disk bootstrap may succeed once all disks are online");
        }
        error!("Disk bootstrap failed: {e}");
        return Err(e.into());
    }

    info!("All disks ready");
    Ok(())
}
