//! Redis implementation of [`DbConnector`].
//!
//! Layout on the server:
//! - rows are hashes named `TABLE<sep>key`
//! - a table's change-stream is the list `TABLE@changes`, one JSON array
//!   `[key, op, field1, value1, ...]` per entry
//! - notification channels are plain pub/sub channels carrying
//!   [`NotificationMessage::to_json`] payloads

use async_trait::async_trait;
use log::{debug, info, warn};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::consumer::{FieldValue, KeyOpFieldsValues, Operation};
use crate::db::{DbConnector, DbError, DbId, Result};
use crate::notification::{NotificationMessage, NotificationSubscription};

/// Configuration for a Redis connection.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: DbId,
}

impl RedisConfig {
    pub fn new(host: impl Into<String>, port: u16, db: DbId) -> Self {
        Self {
            host: host.into(),
            port,
            db,
        }
    }

    fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db.index())
    }
}

fn command_error(op: &'static str) -> impl Fn(redis::RedisError) -> DbError {
    move |e| DbError::Command(format!("{} failed: {}", op, e))
}

/// One logical database on a Redis server.
pub struct RedisDb {
    config: RedisConfig,
    client: redis::Client,
    connection: ConnectionManager,
}

impl RedisDb {
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let uri = config.uri();
        let client = redis::Client::open(uri.clone())
            .map_err(|e| DbError::Connection(format!("{}: {}", uri, e)))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to create connection manager: {}", e)))?;

        info!("Connected to Redis: {} ({})", uri, config.db.name());
        Ok(Self {
            config,
            client,
            connection,
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    fn changes_list(table: &str) -> String {
        format!("{}@changes", table)
    }
}

/// Flattens an entry to `[key, op, field1, value1, ...]`.
fn encode_entry(entry: &KeyOpFieldsValues) -> Result<String> {
    let mut data = vec![entry.key.clone(), entry.op.as_str().to_string()];
    for (f, v) in &entry.fvs {
        data.push(f.clone());
        data.push(v.clone());
    }
    serde_json::to_string(&data).map_err(|e| DbError::InvalidData(e.to_string()))
}

fn parse_redis_entry(data: &[String]) -> Result<KeyOpFieldsValues> {
    if data.len() < 2 {
        return Err(DbError::InvalidData(
            "Entry must have at least key and operation".to_string(),
        ));
    }

    let op = match data[1].as_str() {
        "SET" => Operation::Set,
        "DEL" => Operation::Del,
        unknown => return Err(DbError::InvalidData(format!("Unknown operation: {}", unknown))),
    };

    let fvs = data[2..]
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();

    Ok(KeyOpFieldsValues::new(data[0].clone(), op, fvs))
}

fn decode_entry(payload: &str) -> Result<KeyOpFieldsValues> {
    let data: Vec<String> =
        serde_json::from_str(payload).map_err(|e| DbError::InvalidData(format!("{}: {}", payload, e)))?;
    parse_redis_entry(&data)
}

#[async_trait]
impl DbConnector for RedisDb {
    fn id(&self) -> DbId {
        self.config.db
    }

    async fn hset(&self, table: &str, key: &str, fvs: &[FieldValue]) -> Result<()> {
        if fvs.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection.clone();
        conn.hset_multiple::<_, _, _, ()>(self.row_name(table, key), fvs)
            .await
            .map_err(command_error("HSET"))
    }

    async fn hget(&self, table: &str, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        conn.hget(self.row_name(table, key), field)
            .await
            .map_err(command_error("HGET"))
    }

    async fn hgetall(&self, table: &str, key: &str) -> Result<Vec<FieldValue>> {
        let mut conn = self.connection.clone();
        conn.hgetall(self.row_name(table, key))
            .await
            .map_err(command_error("HGETALL"))
    }

    async fn hdel(&self, table: &str, key: &str, field: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.hdel::<_, _, ()>(self.row_name(table, key), field)
            .await
            .map_err(command_error("HDEL"))
    }

    async fn del(&self, table: &str, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.row_name(table, key))
            .await
            .map_err(command_error("DEL"))
    }

    async fn keys(&self, table: &str) -> Result<Vec<String>> {
        let prefix = format!("{}{}", table, self.separator());
        let mut conn = self.connection.clone();
        let names: Vec<String> = conn
            .keys(format!("{}*", prefix))
            .await
            .map_err(command_error("KEYS"))?;
        Ok(names
            .into_iter()
            .filter_map(|n| n.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    async fn row_names(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        let names: Vec<String> = conn.keys(pattern).await.map_err(command_error("KEYS"))?;
        Ok(names.into_iter().filter(|n| !n.ends_with("@changes")).collect())
    }

    async fn del_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.connection.clone();
        let names: Vec<String> = conn.keys(pattern).await.map_err(command_error("KEYS"))?;
        if names.is_empty() {
            return Ok(0);
        }
        debug!("Deleting {} keys matching {}", names.len(), pattern);
        conn.del(names).await.map_err(command_error("DEL"))
    }

    async fn push_change(&self, table: &str, entry: KeyOpFieldsValues) -> Result<()> {
        let payload = encode_entry(&entry)?;
        let mut conn = self.connection.clone();
        conn.rpush::<_, _, ()>(Self::changes_list(table), payload)
            .await
            .map_err(command_error("RPUSH"))
    }

    async fn pop_changes(&self, table: &str, max: usize) -> Result<Vec<KeyOpFieldsValues>> {
        if max == 0 {
            return Ok(vec![]);
        }
        let list = Self::changes_list(table);
        let mut conn = self.connection.clone();
        let (payloads, ()): (Vec<String>, ()) = redis::pipe()
            .atomic()
            .lrange(&list, 0, max as isize - 1)
            .ltrim(&list, max as isize, -1)
            .query_async(&mut conn)
            .await
            .map_err(command_error("LRANGE/LTRIM"))?;

        let mut entries = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match decode_entry(&payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Dropping malformed change on {}: {}", table, e),
            }
        }
        Ok(entries)
    }

    async fn pending_changes(&self, table: &str) -> Result<usize> {
        let mut conn = self.connection.clone();
        conn.llen(Self::changes_list(table))
            .await
            .map_err(command_error("LLEN"))
    }

    async fn publish(&self, channel: &str, message: &NotificationMessage) -> Result<usize> {
        let payload = message.to_json()?;
        let mut conn = self.connection.clone();
        conn.publish(channel, payload)
            .await
            .map_err(command_error("PUBLISH"))
    }

    async fn subscribe(&self, channel: &str) -> Result<NotificationSubscription> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| DbError::Connection(format!("pubsub connection: {}", e)))?;
        pubsub.subscribe(channel).await.map_err(command_error("SUBSCRIBE"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let name = channel.to_string();
        tokio::spawn(async move {
            let mut stream = pubsub.into_on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Non-string payload on {}: {}", name, e);
                        continue;
                    }
                };
                match NotificationMessage::from_json(&payload) {
                    Ok(m) => {
                        if tx.send(m).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dropping malformed notification on {}: {}", name, e),
                }
            }
            debug!("Subscription to {} closed", name);
        });

        Ok(NotificationSubscription::new(channel, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config() {
        let config = RedisConfig::new("127.0.0.1", 6379, DbId::ConfigDb);
        assert_eq!(config.uri(), "redis://127.0.0.1:6379/4");
    }

    #[test]
    fn test_parse_redis_entry_set() {
        let data = vec![
            "PORT-1-1".to_string(),
            "SET".to_string(),
            "admin-state".to_string(),
            "ENABLED".to_string(),
            "index".to_string(),
            "1".to_string(),
        ];

        let entry = parse_redis_entry(&data).unwrap();
        assert_eq!(entry.key, "PORT-1-1");
        assert_eq!(entry.op, Operation::Set);
        assert_eq!(entry.fvs.len(), 2);
        assert_eq!(entry.get_field("admin-state"), Some("ENABLED"));
    }

    #[test]
    fn test_parse_redis_entry_del() {
        let data = vec!["PORT-1-1".to_string(), "DEL".to_string()];
        let entry = parse_redis_entry(&data).unwrap();
        assert_eq!(entry.op, Operation::Del);
        assert!(entry.fvs.is_empty());
    }

    #[test]
    fn test_parse_redis_entry_invalid() {
        assert!(parse_redis_entry(&["PORT-1-1".to_string()]).is_err());
        assert!(parse_redis_entry(&["k".to_string(), "MERGE".to_string()]).is_err());
    }

    #[test]
    fn test_entry_encoding() {
        let entry = KeyOpFieldsValues::set("OCH-1-1-L1", vec![("frequency".to_string(), "193100000".to_string())]);
        let payload = encode_entry(&entry).unwrap();
        assert_eq!(payload, r#"["OCH-1-1-L1","SET","frequency","193100000"]"#);
        let back = decode_entry(&payload).unwrap();
        assert_eq!(back.key, entry.key);
        assert_eq!(back.fvs, entry.fvs);
    }
}
