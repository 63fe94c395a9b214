//! Imperative set/get and readiness query against a running agent.

use std::process::ExitCode;

use clap::Parser;
use log::{error, warn};
use otn_tools::cmd::{self, Command, REPLY_TIMEOUT, USAGE};
use otn_tools::{connect_appl, NotificationClient, ToolError};

#[derive(Parser, Debug)]
#[command(name = "cmd", about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    #[command(subcommand)]
    command: Command,
}

async fn run(args: &Args) -> otn_tools::Result<Vec<String>> {
    let db = connect_appl(&args.redis_host, args.redis_port).await?;
    let client = NotificationClient::new(db);
    cmd::run(&client, &args.command, REPLY_TIMEOUT).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            println!("{}", USAGE);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    match run(&args).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(ToolError::Usage(usage)) => {
            println!("{}", usage);
            ExitCode::FAILURE
        }
        Err(e) => {
            match &e {
                ToolError::Timeout { .. } => warn!("command exec failed (timed out): {}", e),
                ToolError::Failed { .. } => warn!("command exec failed, {}", e),
                _ => error!("command exec failed: {}", e),
            }
            println!("command exec failed");
            ExitCode::FAILURE
        }
    }
}
