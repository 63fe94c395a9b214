//! Line-card orchestration agent entry point.
//!
//! Connects the five databases, binds the HAL, registers every orchestrator
//! and runs the event loop until Ctrl-C/SIGTERM or a fatal error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sonic_orch_common::{DbConnector, DbId};
use sonic_otai::{OtaiApi, VirtualOtai};
use sonic_otn_orchagent::audit::{init_logging, init_logging_pretty};
use sonic_otn_orchagent::context::{ContextOptions, Databases};
use sonic_otn_orchagent::flex_counter::FlexCounterOrchConfig;
use sonic_otn_orchagent::linecard::LinecardOrchConfig;
use sonic_otn_orchagent::{OrchDaemon, OrchDaemonConfig, SharedRuntimeContext, StopHandle};
use tracing::{error, info, warn};

/// HAL implementations the agent can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Hal {
    /// In-memory HAL without hardware.
    Virtual,
}

/// Line-card orchestration agent
#[derive(Parser, Debug)]
#[command(name = "orchagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines instead of the console format
    #[arg(long)]
    json_logs: bool,

    /// Batch size for consumer table operations
    #[arg(short = 'b', long, default_value = "128")]
    batch_size: usize,

    /// Slot of the linecard this agent drives
    #[arg(short = 's', long, default_value = "0")]
    slot_id: u32,

    /// Counter-ID manifest (flex counter JSON)
    #[arg(short = 'f', long)]
    flex_counter_json: Option<PathBuf>,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    /// Keep every database in process memory instead of Redis
    #[arg(long)]
    in_memory: bool,

    /// HAL implementation
    #[arg(long, value_enum, default_value = "virtual")]
    hal: Hal,
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

async fn databases(args: &Args) -> anyhow::Result<Databases> {
    if args.in_memory {
        return Ok(Databases::in_memory());
    }
    Ok(Databases {
        appl: connect(&args.redis_host, args.redis_port, DbId::ApplDb).await?,
        state: connect(&args.redis_host, args.redis_port, DbId::StateDb).await?,
        counters: connect(&args.redis_host, args.redis_port, DbId::CountersDb).await?,
        config: connect(&args.redis_host, args.redis_port, DbId::ConfigDb).await?,
        flex_counter: connect(&args.redis_host, args.redis_port, DbId::FlexCounterDb).await?,
    })
}

fn hal(kind: Hal) -> Arc<dyn OtaiApi> {
    match kind {
        Hal::Virtual => Arc::new(VirtualOtai::new()),
    }
}

/// Stops the loop on Ctrl-C/SIGTERM and requests log rotation on SIGHUP.
fn spawn_signal_handlers(handle: StopHandle) {
    let stop = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received SIGINT, shutting down");
                stop.stop();
            }
            Err(err) => error!("Failed to listen for ctrl-c: {}", err),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let stop = handle.clone();
        tokio::spawn(async move {
            if let Ok(mut term) = signal(SignalKind::terminate()) {
                term.recv().await;
                warn!("Received SIGTERM, shutting down");
                stop.stop();
            }
        });
        tokio::spawn(async move {
            let Ok(mut hup) = signal(SignalKind::hangup()) else {
                return;
            };
            while hup.recv().await.is_some() {
                info!("Received SIGHUP, log rotate requested");
                handle.request_log_rotate();
            }
        });
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("Starting orchagent, slot {}", args.slot_id);
    info!("Batch size: {}", args.batch_size);
    if let Some(path) = &args.flex_counter_json {
        info!("Flex counter manifest: {}", path.display());
    }

    let options = ContextOptions {
        slot_id: args.slot_id,
        batch_size: args.batch_size,
        flex_counter_json: args.flex_counter_json.clone(),
        flex_counter: FlexCounterOrchConfig::default(),
    };
    let dbs = databases(&args).await?;
    let ctx = SharedRuntimeContext::new(hal(args.hal), dbs, options)
        .await
        .context("Failed to build runtime context")?;

    let config = OrchDaemonConfig {
        batch_size: args.batch_size,
        ..OrchDaemonConfig::default()
    };
    let mut daemon = OrchDaemon::with_default_orchs(ctx, config, LinecardOrchConfig::default())
        .await
        .context("Failed to register orchestrators")?;
    spawn_signal_handlers(daemon.stop_handle());

    daemon.run().await.context("orchagent event loop failed")?;
    info!("orchagent shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.json_logs {
        init_logging(&args.log_level);
    } else {
        init_logging_pretty(&args.log_level);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
