//! Transceiver firmware download and flash partition control.

use std::time::Duration;

use clap::ValueEnum;
use log::info;
use sonic_orch_common::FieldValue;

use crate::client::NotificationClient;
use crate::error::{Result, ToolError};

pub const UPGRADE_CHANNEL: &str = "UPGRADE_TRANSCEIVER";
pub const UPGRADE_REPLY: &str = "UPGRADE_TRANSCEIVER_REPLY";
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

const UPGRADE_STATE: &str = "UPGRADE_STATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpgradeOp {
    Switch,
    Backup,
    State,
    Download,
}

impl UpgradeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeOp::Switch => "switch",
            UpgradeOp::Backup => "backup",
            UpgradeOp::State => "state",
            UpgradeOp::Download => "download",
        }
    }

    fn needs_partition(&self) -> bool {
        matches!(self, UpgradeOp::Switch | UpgradeOp::Backup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub op: UpgradeOp,
    pub slot_id: Option<String>,
    pub line_id: Option<String>,
    pub partition: Option<String>,
}

fn single_digit(id: Option<&str>) -> Option<&str> {
    id.filter(|s| s.len() == 1 && s.chars().all(|c| c.is_ascii_digit()))
}

impl UpgradeRequest {
    /// Checks the arguments and builds the request values.
    pub fn values(&self) -> Result<Vec<FieldValue>> {
        let mut values = Vec::new();
        if self.op.needs_partition() {
            let partition = match self.partition.as_deref() {
                None | Some("") => return Err(ToolError::Usage("Miss argument! -p is necessary".into())),
                Some(p) => p,
            };
            if partition != "A" && partition != "B" {
                return Err(ToolError::Usage("partition should be A or B".into()));
            }
            values.push(("partition".to_string(), partition.to_string()));
        }

        let slot = single_digit(self.slot_id.as_deref())
            .ok_or_else(|| ToolError::Usage("Slot-id is invalid, should be a digital".into()))?;
        let line = single_digit(self.line_id.as_deref())
            .ok_or_else(|| ToolError::Usage("Line-id is invalid, should be a digital".into()))?;
        values.push(("key".to_string(), format!("TRANSCEIVER-1-{}-L{}", slot, line)));
        Ok(values)
    }
}

/// Sends the request; returns the upgrade state for `state`, `None` otherwise.
pub async fn run(client: &NotificationClient, request: &UpgradeRequest, timeout: Duration) -> Result<Option<String>> {
    let values = request.values()?;
    let op = request.op.as_str();
    info!("requested {}", op);

    let reply = client.call(UPGRADE_CHANNEL, UPGRADE_REPLY, op, op, values, timeout).await?;
    if reply.data != "SUCCESS" {
        return Err(ToolError::Failed {
            op_ret: reply.op,
            data: reply.data,
        });
    }
    if request.op != UpgradeOp::State {
        return Ok(None);
    }
    match reply.value(UPGRADE_STATE) {
        Some(state) => Ok(Some(state.to_string())),
        None => Err(ToolError::Failed {
            op_ret: reply.op.clone(),
            data: format!("{} missing from reply", UPGRADE_STATE),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_orch_common::{DbConnector, DbId, MemoryDb, NotificationConsumer, NotificationMessage, NotificationProducer};
    use std::sync::Arc;

    fn request(op: UpgradeOp, slot: Option<&str>, line: Option<&str>, partition: Option<&str>) -> UpgradeRequest {
        UpgradeRequest {
            op,
            slot_id: slot.map(str::to_string),
            line_id: line.map(str::to_string),
            partition: partition.map(str::to_string),
        }
    }

    fn usage_message(req: &UpgradeRequest) -> String {
        match req.values() {
            Err(ToolError::Usage(msg)) => msg,
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            usage_message(&request(UpgradeOp::Switch, Some("1"), Some("1"), None)),
            "Miss argument! -p is necessary"
        );
        assert_eq!(
            usage_message(&request(UpgradeOp::Backup, Some("1"), Some("1"), Some("C"))),
            "partition should be A or B"
        );
        assert_eq!(
            usage_message(&request(UpgradeOp::State, Some("12"), Some("1"), None)),
            "Slot-id is invalid, should be a digital"
        );
        assert_eq!(
            usage_message(&request(UpgradeOp::Download, Some("1"), Some("x"), None)),
            "Line-id is invalid, should be a digital"
        );
    }

    #[test]
    fn test_request_values() {
        let values = request(UpgradeOp::Switch, Some("1"), Some("2"), Some("B")).values().unwrap();
        assert_eq!(
            values,
            vec![
                ("partition".to_string(), "B".to_string()),
                ("key".to_string(), "TRANSCEIVER-1-1-L2".to_string()),
            ]
        );
        let values = request(UpgradeOp::Download, Some("3"), Some("1"), Some("A")).values().unwrap();
        assert_eq!(values, vec![("key".to_string(), "TRANSCEIVER-1-3-L1".to_string())]);
    }

    #[tokio::test]
    async fn test_state_reply() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        let mut requests = NotificationConsumer::new(&db, UPGRADE_CHANNEL).await.unwrap();
        let producer = NotificationProducer::new(Arc::clone(&db), UPGRADE_REPLY);
        let server = tokio::spawn(async move {
            let req = requests.recv_timeout(Duration::from_secs(5)).await.unwrap();
            let values = vec![(UPGRADE_STATE.to_string(), "IDLE".to_string())];
            producer.send("state", "SUCCESS", values).await.unwrap();
            req
        });

        let client = NotificationClient::new(Arc::clone(&db));
        let state = run(&client, &request(UpgradeOp::State, Some("1"), Some("1"), None), Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(state.as_deref(), Some("IDLE"));

        let req: NotificationMessage = server.await.unwrap();
        assert_eq!(req.op, "state");
        assert_eq!(req.data, "state");
        assert_eq!(req.get_field("key"), Some("TRANSCEIVER-1-1-L1"));
    }

    #[tokio::test]
    async fn test_failed_reply() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        let mut requests = NotificationConsumer::new(&db, UPGRADE_CHANNEL).await.unwrap();
        let producer = NotificationProducer::new(Arc::clone(&db), UPGRADE_REPLY);
        tokio::spawn(async move {
            if let Some(req) = requests.recv_timeout(Duration::from_secs(5)).await {
                producer.send(&req.op, "FAILED", req.values).await.unwrap();
            }
        });

        let client = NotificationClient::new(db);
        let err = run(&client, &request(UpgradeOp::Switch, Some("1"), Some("1"), Some("A")), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed { ref data, .. } if data == "FAILED"));
    }
}
