//! filedispatch
//!
//! Usage:
//!     filedispatch --config settings.yaml --server-url http://127.0.0.1:8000

mod logging;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use filedispatch::{DispatchConfig, Dispatcher};
use filedispatch_directory_watcher::Settings;
use filedispatch_notifier::{DEFAULT_ENDPOINT_PATH, NotifierConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "filedispatch",
    version,
    about = "Dispatch new files to local, HTTP and FTP destinations"
)]
struct Args {
    /// Settings file (.yaml or .yml)
    #[arg(short, long)]
    config: PathBuf,

    /// Log level or filter directive
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Base URL of the audit API; outcomes are only logged without it
    #[arg(long)]
    server_url: Option<String>,

    /// Audit endpoint path, relative to the server URL
    #[arg(long, default_value = DEFAULT_ENDPOINT_PATH)]
    endpoint: String,

    /// Seconds to wait for in-flight transfers on shutdown
    #[arg(long, default_value_t = 10)]
    grace_secs: u64,

    /// Milliseconds a new file must stay unchanged before it is dispatched
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _log_guard = logging::init(&args.log_level, args.log_file.as_deref())?;

    let settings = Settings::load(&args.config)
        .with_context(|| format!("cannot load settings from {}", args.config.display()))?;

    let mut config = DispatchConfig::default()
        .with_grace(Duration::from_secs(args.grace_secs))
        .with_settle(Duration::from_millis(args.settle_ms));
    if let Some(server_url) = &args.server_url {
        let audit = NotifierConfig::from_server(server_url, &args.endpoint)
            .context("invalid audit endpoint")?;
        info!(endpoint = %audit.endpoint, "Reporting outcomes to the audit API");
        config = config.with_audit(audit);
    }

    let dispatcher = Dispatcher::new(&settings, config)?;
    dispatcher.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for shutdown signal")?;
    info!("Shutdown requested");

    dispatcher.stop().await;
    Ok(())
}
