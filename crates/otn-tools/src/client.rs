//! Request/reply exchange over a pair of notification channels.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use sonic_orch_common::{DbConnector, FieldValue, NotificationConsumer, NotificationMessage, NotificationProducer};
use tokio::time::Instant;

use crate::error::{Result, ToolError};

/// Reply received for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub op: String,
    pub data: String,
    pub values: Vec<FieldValue>,
}

impl Reply {
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.iter().find(|(f, _)| f == field).map(|(_, v)| v.as_str())
    }
}

impl From<NotificationMessage> for Reply {
    fn from(msg: NotificationMessage) -> Self {
        Self {
            op: msg.op,
            data: msg.data,
            values: msg.values,
        }
    }
}

#[derive(Clone)]
pub struct NotificationClient {
    db: Arc<dyn DbConnector>,
}

impl NotificationClient {
    pub fn new(db: Arc<dyn DbConnector>) -> Self {
        Self { db }
    }

    /// Sends `(op, data, values)` on `query` and returns the first message
    /// seen on `reply` within `timeout`.
    pub async fn call(
        &self,
        query: &str,
        reply: &str,
        op: &str,
        data: &str,
        values: Vec<FieldValue>,
        timeout: Duration,
    ) -> Result<Reply> {
        self.call_until(query, reply, op, data, values, timeout, |_| true).await
    }

    /// Like [`call`](Self::call) but skips replies `accept` rejects, which
    /// other clients sharing the reply channel may have caused.
    #[allow(clippy::too_many_arguments)]
    pub async fn call_until<F>(
        &self,
        query: &str,
        reply: &str,
        op: &str,
        data: &str,
        values: Vec<FieldValue>,
        timeout: Duration,
        accept: F,
    ) -> Result<Reply>
    where
        F: Fn(&NotificationMessage) -> bool,
    {
        // Subscribe before sending so a fast reply is not lost.
        let mut replies = NotificationConsumer::new(&self.db, reply).await?;
        let producer = NotificationProducer::new(Arc::clone(&self.db), query);
        let receivers = producer.send(op, data, values).await?;
        debug!("sent {} {} on {} ({} receivers)", op, data, query, receivers);

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match replies.recv_timeout(remaining).await {
                Some(msg) if accept(&msg) => return Ok(msg.into()),
                Some(msg) => debug!("ignoring reply {} {} on {}", msg.op, msg.data, reply),
                None => break,
            }
        }
        Err(ToolError::Timeout {
            channel: reply.to_string(),
            timeout_ms: timeout.as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_orch_common::{DbId, MemoryDb};

    fn fv(f: &str, v: &str) -> FieldValue {
        (f.to_string(), v.to_string())
    }

    /// Answers every request on `query` with `answer(request)` on `reply`.
    async fn responder<F>(db: &Arc<dyn DbConnector>, query: &str, reply: &str, answer: F)
    where
        F: Fn(&NotificationMessage) -> Vec<NotificationMessage> + Send + 'static,
    {
        let mut requests = NotificationConsumer::new(db, query).await.unwrap();
        let producer = NotificationProducer::new(Arc::clone(db), reply);
        tokio::spawn(async move {
            while let Some(request) = requests.recv_timeout(Duration::from_secs(5)).await {
                for msg in answer(&request) {
                    producer.send(&msg.op, &msg.data, msg.values).await.unwrap();
                }
            }
        });
    }

    #[tokio::test]
    async fn test_call_returns_reply() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        responder(&db, "PORT_NOTIFICATION", "PORT_REPLY", |req| {
            vec![NotificationMessage::new("SUCCESS", req.data.clone(), req.values.clone())]
        })
        .await;

        let client = NotificationClient::new(Arc::clone(&db));
        let reply = client
            .call(
                "PORT_NOTIFICATION",
                "PORT_REPLY",
                "set",
                "PORT-1-1",
                vec![fv("admin-state", "ENABLED")],
                Duration::from_millis(500),
            )
            .await
            .unwrap();
        assert_eq!(reply.op, "SUCCESS");
        assert_eq!(reply.data, "PORT-1-1");
        assert_eq!(reply.value("admin-state"), Some("ENABLED"));
        assert_eq!(reply.value("missing"), None);
    }

    #[tokio::test]
    async fn test_call_times_out_without_responder() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        let client = NotificationClient::new(db);
        let err = client
            .call("OTDR_NOTIFICATION", "OTDR_REPLY", "set", "OTDR-1-1", Vec::new(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "no reply on OTDR_REPLY within 20 ms");
    }

    #[tokio::test]
    async fn test_call_until_skips_foreign_replies() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        responder(&db, "OCM_NOTIFICATION", "OCM_REPLY", |req| {
            vec![
                NotificationMessage::new("SUCCESS", "OCM-1-9", Vec::new()),
                NotificationMessage::new("FAILED", req.data.clone(), Vec::new()),
            ]
        })
        .await;

        let client = NotificationClient::new(Arc::clone(&db));
        let reply = client
            .call_until(
                "OCM_NOTIFICATION",
                "OCM_REPLY",
                "set",
                "OCM-1-1",
                vec![fv("scan", "true")],
                Duration::from_millis(500),
                |msg| msg.data == "OCM-1-1",
            )
            .await
            .unwrap();
        assert_eq!(reply.op, "FAILED");
        assert_eq!(reply.data, "OCM-1-1");
    }
}
