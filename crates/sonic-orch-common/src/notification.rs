//! Point-to-point notification channels.
//!
//! A request/reply exchange is a pair of channels: the client publishes a
//! [`NotificationMessage`] on the query channel and waits for the reply on the
//! reply channel. The orchestrator side reads queries with a
//! [`NotificationConsumer`] and answers with a [`NotificationProducer`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::consumer::FieldValue;
use crate::db::{DbConnector, DbError, Result};

/// `(operation, data, field-values)` as carried on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String, Vec<FieldValue>)", into = "(String, String, Vec<FieldValue>)")]
pub struct NotificationMessage {
    pub op: String,
    pub data: String,
    pub values: Vec<FieldValue>,
}

impl From<(String, String, Vec<FieldValue>)> for NotificationMessage {
    fn from((op, data, values): (String, String, Vec<FieldValue>)) -> Self {
        Self { op, data, values }
    }
}

impl From<NotificationMessage> for (String, String, Vec<FieldValue>) {
    fn from(m: NotificationMessage) -> Self {
        (m.op, m.data, m.values)
    }
}

impl NotificationMessage {
    pub fn new(op: impl Into<String>, data: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            op: op.into(),
            data: data.into(),
            values,
        }
    }

    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Wire form: `[op, data, [[field, value], ...]]`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DbError::InvalidData(e.to_string()))
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| DbError::InvalidData(format!("{}: {}", payload, e)))
    }
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct NotificationSubscription {
    channel: String,
    rx: mpsc::UnboundedReceiver<NotificationMessage>,
}

impl NotificationSubscription {
    pub fn new(channel: impl Into<String>, rx: mpsc::UnboundedReceiver<NotificationMessage>) -> Self {
        Self {
            channel: channel.into(),
            rx,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn has_data(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn try_recv(&mut self) -> Option<NotificationMessage> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next message.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<NotificationMessage> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }
}

/// Publishes on one channel.
#[derive(Clone)]
pub struct NotificationProducer {
    db: Arc<dyn DbConnector>,
    channel: String,
}

impl NotificationProducer {
    pub fn new(db: Arc<dyn DbConnector>, channel: impl Into<String>) -> Self {
        Self {
            db,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn send(&self, op: &str, data: &str, values: Vec<FieldValue>) -> Result<usize> {
        self.db
            .publish(&self.channel, &NotificationMessage::new(op, data, values))
            .await
    }
}

/// Reads queries from one channel.
#[derive(Debug)]
pub struct NotificationConsumer {
    subscription: NotificationSubscription,
}

impl NotificationConsumer {
    pub async fn new(db: &Arc<dyn DbConnector>, channel: &str) -> Result<Self> {
        Ok(Self {
            subscription: db.subscribe(channel).await?,
        })
    }

    pub fn channel(&self) -> &str {
        self.subscription.channel()
    }

    pub fn has_data(&self) -> bool {
        self.subscription.has_data()
    }

    pub fn pop(&mut self) -> Option<NotificationMessage> {
        self.subscription.try_recv()
    }

    /// Pops every queued message.
    pub fn pops(&mut self) -> Vec<NotificationMessage> {
        std::iter::from_fn(|| self.subscription.try_recv()).collect()
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<NotificationMessage> {
        self.subscription.recv_timeout(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_json_shape() {
        let msg = NotificationMessage::new("set", "PORT-1-1", vec![("scan".to_string(), "true".to_string())]);
        let json = msg.to_json().unwrap();
        assert_eq!(json, r#"["set","PORT-1-1",[["scan","true"]]]"#);
        assert_eq!(NotificationMessage::from_json(&json).unwrap(), msg);
        assert!(NotificationMessage::from_json("{}").is_err());
    }

    #[tokio::test]
    async fn test_subscription_timeout() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = NotificationSubscription::new("X_REPLY", rx);
        assert!(!sub.has_data());
        assert!(sub.recv_timeout(Duration::from_millis(10)).await.is_none());

        tx.send(NotificationMessage::new("SUCCESS", "k", vec![])).unwrap();
        assert!(sub.has_data());
        let got = sub.recv_timeout(Duration::from_millis(10)).await.unwrap();
        assert_eq!(got.op, "SUCCESS");
    }
}
