//! Prints every STATE_DB and COUNTERS_DB row of a running line card.

use std::process::ExitCode;

use clap::Parser;
use log::error;
use otn_tools::connect_db;
use otn_tools::dump::dump_state_and_counters;
use sonic_orch_common::DbId;

#[derive(Parser, Debug)]
#[command(name = "dump_state_counter_db", about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,
}

async fn run(args: &Args) -> otn_tools::Result<Vec<String>> {
    let state = connect_db(&args.redis_host, args.redis_port, DbId::StateDb).await?;
    let counters = connect_db(&args.redis_host, args.redis_port, DbId::CountersDb).await?;
    dump_state_and_counters(state.as_ref(), counters.as_ref()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    match run(&args).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("dump failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
