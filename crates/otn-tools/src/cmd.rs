//! Imperative requests to the object channels of the agent.

use std::time::Duration;

use clap::Subcommand;
use log::info;

use crate::client::{NotificationClient, Reply};
use crate::error::{Result, ToolError};

pub const USAGE: &str = "Usage: cmd [set|get|state]
    cmd set <TABLE> <KEY> <FIELD>=<VALUE>
    cmd get <TABLE> <KEY> <FIELD>

    cmd state";

pub const REPLY_TIMEOUT: Duration = Duration::from_millis(15000);

const SET_TABLES: &[&str] = &["APS", "ETHERNET", "TRANSCEIVER", "PORT", "LINECARD", "OTDR"];
const GET_TABLES: &[&str] = &["LINECARD"];

const DIAG_CHANNEL: &str = "SWSS_DIAG_CHANNEL";
const DIAG_REPLY: &str = "SWSS_DIAG_REPLY";
const SUCCESS: &str = "SUCCESS";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write one field of an object
    Set {
        table: String,
        key: String,
        /// FIELD=VALUE
        assignment: String,
    },
    /// Read one field of an object
    Get { table: String, key: String, field: String },
    /// Query the readiness state of the agent
    State,
}

/// Query and reply channel of `table`, if the operation supports it.
pub fn channels(table: &str, allowed: &[&str]) -> Result<(String, String)> {
    if !allowed.contains(&table) {
        return Err(ToolError::InvalidTable(table.to_string()));
    }
    Ok((format!("{}_NOTIFICATION", table), format!("{}_REPLY", table)))
}

fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    match assignment.split_once('=') {
        Some((field, value)) if !field.is_empty() && !value.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(ToolError::Usage(USAGE.to_string())),
    }
}

fn expect_success(reply: Reply) -> Result<Reply> {
    if reply.op == SUCCESS {
        Ok(reply)
    } else {
        Err(ToolError::Failed {
            op_ret: reply.op,
            data: reply.data,
        })
    }
}

pub async fn set(client: &NotificationClient, table: &str, key: &str, assignment: &str, timeout: Duration) -> Result<()> {
    let (query, reply) = channels(table, SET_TABLES)?;
    let (field, value) = parse_assignment(assignment)?;
    info!("set {}, {}={}", key, field, value);
    let values = vec![(field, value)];
    expect_success(client.call(&query, &reply, "set", key, values, timeout).await?)?;
    Ok(())
}

pub async fn get(client: &NotificationClient, table: &str, key: &str, field: &str, timeout: Duration) -> Result<String> {
    let (query, reply) = channels(table, GET_TABLES)?;
    let values = vec![(field.to_string(), String::new())];
    let reply = expect_success(client.call(&query, &reply, "get", key, values, timeout).await?)?;
    reply.value(field).map(str::to_string).ok_or_else(|| ToolError::Failed {
        op_ret: reply.op.clone(),
        data: format!("{} missing from reply", field),
    })
}

pub async fn state(client: &NotificationClient, timeout: Duration) -> Result<Vec<String>> {
    let reply = expect_success(client.call(DIAG_CHANNEL, DIAG_REPLY, "state", "state", Vec::new(), timeout).await?)?;
    Ok(reply.values.into_iter().map(|(_, v)| v).collect())
}

/// Runs `command` and returns the lines to print on success.
pub async fn run(client: &NotificationClient, command: &Command, timeout: Duration) -> Result<Vec<String>> {
    match command {
        Command::Set { table, key, assignment } => {
            set(client, table, key, assignment, timeout).await?;
            Ok(Vec::new())
        }
        Command::Get { table, key, field } => Ok(vec![get(client, table, key, field, timeout).await?]),
        Command::State => Ok(state(client, timeout)
            .await?
            .into_iter()
            .map(|v| format!("state: {}", v))
            .collect()),
    }
}
