//! configsyncd entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sonic_orch_common::{DbConnector, DbId};
use sonic_otn_configsyncd::{SyncDaemon, SyncDaemonConfig, SyncDatabases};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Mirrors CONFIG_DB into APPL_DB; exits if CONFIG_DB holds no configuration
#[derive(Parser, Debug)]
#[command(name = "configsyncd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    /// Keep every database in process memory instead of Redis
    #[arg(long)]
    in_memory: bool,
}

#[cfg(feature = "redis")]
async fn connect(host: &str, port: u16, id: DbId) -> anyhow::Result<Arc<dyn DbConnector>> {
    use sonic_orch_common::{RedisConfig, RedisDb};

    let db = RedisDb::connect(RedisConfig::new(host, port, id))
        .await
        .with_context(|| format!("Failed to connect {} at {}:{}", id.name(), host, port))?;
    Ok(Arc::new(db))
}

#[cfg(not(feature = "redis"))]
async fn connect(_host: &str, _port: u16, id: DbId) -> anyhow::Result<Arc<dyn DbConnector>> {
    warn!("Built without redis support, {} kept in memory", id.name());
    Ok(Arc::new(sonic_orch_common::MemoryDb::new(id)))
}

async fn databases(args: &Args) -> anyhow::Result<SyncDatabases> {
    if args.in_memory {
        return Ok(SyncDatabases::in_memory());
    }
    Ok(SyncDatabases {
        config: connect(&args.redis_host, args.redis_port, DbId::ConfigDb).await?,
        appl: connect(&args.redis_host, args.redis_port, DbId::ApplDb).await?,
        state: connect(&args.redis_host, args.redis_port, DbId::StateDb).await?,
    })
}

fn spawn_signal_handlers(token: CancellationToken) {
    let stop = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received SIGINT, shutting down");
            stop.cancel();
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        if let Ok(mut term) = signal(SignalKind::terminate()) {
            term.recv().await;
            warn!("Received SIGTERM, shutting down");
            token.cancel();
        }
    });
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("Starting configsyncd");
    let dbs = databases(&args).await?;
    let mut daemon = SyncDaemon::with_default_syncs(dbs, SyncDaemonConfig::default());

    let token = CancellationToken::new();
    spawn_signal_handlers(token.clone());
    daemon.run(token).await.context("configsyncd event loop failed")?;
    info!("configsyncd shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
