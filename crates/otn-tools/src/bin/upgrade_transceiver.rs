//! Transceiver firmware upgrade requests.

use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use otn_tools::upgrade::{self, UpgradeOp, UpgradeRequest, REPLY_TIMEOUT};
use otn_tools::{connect_appl, NotificationClient, ToolError};

/// Usage: upgrade_transceiver [switch|backup|state|download]
#[derive(Parser, Debug)]
#[command(name = "upgrade_transceiver", about, long_about = None)]
struct Args {
    #[arg(value_enum)]
    op: UpgradeOp,

    /// Slot id
    #[arg(short = 's', long = "slot-id")]
    slot_id: Option<String>,

    /// Line id
    #[arg(short = 'l', long = "line-id")]
    line_id: Option<String>,

    /// Partition: [A|B]
    #[arg(short = 'p', long)]
    partition: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,
}

async fn run(args: Args) -> otn_tools::Result<Option<String>> {
    let request = UpgradeRequest {
        op: args.op,
        slot_id: args.slot_id,
        line_id: args.line_id,
        partition: args.partition,
    };
    // Validate before touching the store.
    request.values()?;
    let db = connect_appl(&args.redis_host, args.redis_port).await?;
    upgrade::run(&NotificationClient::new(db), &request, REPLY_TIMEOUT).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();
    info!("{}", args.op.as_str());

    match run(args).await {
        Ok(Some(state)) => {
            println!("Upgrade-state: {}", state);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(ToolError::Usage(msg)) => {
            println!("{}", msg);
            ExitCode::FAILURE
        }
        Err(e) => {
            match &e {
                ToolError::Timeout { .. } => warn!("command exec failed (timed out): {}", e),
                _ => error!("command exec failed: {}", e),
            }
            println!("command exec failed");
            ExitCode::FAILURE
        }
    }
}
