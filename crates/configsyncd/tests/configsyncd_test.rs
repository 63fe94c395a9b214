//! End-to-end runs of the sync daemon against in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use sonic_orch_common::{DbConnector, FieldValue, KeyOpFieldsValues, NotificationConsumer, NotificationProducer};
use sonic_otn_configsyncd::{SyncDaemon, SyncDaemonConfig, SyncDatabases};
use tokio_util::sync::CancellationToken;

fn fv(f: &str, v: &str) -> FieldValue {
    (f.to_string(), v.to_string())
}

fn config() -> SyncDaemonConfig {
    SyncDaemonConfig {
        select_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(1),
        linecard_poll_interval: Duration::from_millis(5),
    }
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_daemon_mirrors_and_announces() {
    let dbs = SyncDatabases::in_memory();
    dbs.config
        .hset("PORT", "PORT-1-1", &[fv("index", "1"), fv("admin-state", "ENABLED")])
        .await
        .unwrap();
    dbs.config.hset("TRANSCEIVER", "TRANSCEIVER-1-1-L1", &[fv("index", "1")]).await.unwrap();
    dbs.appl.hset("LINECARD", "LINECARD-1-1", &[fv("linecard-type", "P230C")]).await.unwrap();

    let token = CancellationToken::new();
    let mut daemon = SyncDaemon::with_default_syncs(dbs.clone(), config());
    let stop = token.clone();
    let handle = tokio::spawn(async move {
        daemon.run(stop).await.unwrap();
        daemon
    });

    let appl = Arc::clone(&dbs.appl);
    eventually(|| {
        let appl = Arc::clone(&appl);
        async move { appl.hget("LINECARD", "LINECARD-1-1", "object-count").await.unwrap().as_deref() == Some("2") }
    })
    .await;
    assert_eq!(dbs.appl.hget("PORT", "ConfigDone", "count").await.unwrap().as_deref(), Some("1"));

    dbs.config
        .push_change("PORT", KeyOpFieldsValues::set("PORT-1-1", vec![fv("admin-state", "DISABLED")]))
        .await
        .unwrap();
    eventually(|| {
        let appl = Arc::clone(&appl);
        async move { appl.hget("PORT", "PORT-1-1", "admin-state").await.unwrap().as_deref() == Some("DISABLED") }
    })
    .await;

    token.cancel();
    let daemon = handle.await.unwrap();
    assert_eq!(daemon.sync_names(), vec!["portsync", "transceiversync"]);
}

#[tokio::test]
async fn test_daemon_runs_configured_otdr_schedule() {
    let dbs = SyncDatabases::in_memory();
    dbs.config
        .hset("OTDR", "OTDR-1-1", &[fv("index", "1"), fv("enable", "true"), fv("period", "3600")])
        .await
        .unwrap();
    dbs.state.hset("OTDR", "OTDR-1-1", &[fv("scanning-status", "INACTIVE")]).await.unwrap();
    dbs.appl.hset("LINECARD", "LINECARD-1-1", &[fv("linecard-type", "P230C")]).await.unwrap();

    let mut requests = NotificationConsumer::new(&dbs.appl, "OTDR_NOTIFICATION").await.unwrap();
    let replies = NotificationProducer::new(Arc::clone(&dbs.appl), "OTDR_REPLY");

    let token = CancellationToken::new();
    let mut daemon = SyncDaemon::with_default_syncs(dbs.clone(), config());
    let stop = token.clone();
    let handle = tokio::spawn(async move { daemon.run(stop).await.unwrap() });

    let request = requests.recv_timeout(Duration::from_secs(2)).await.unwrap();
    assert_eq!(request.op, "set");
    assert_eq!(request.data, "OTDR-1-1");
    assert_eq!(request.get_field("scan"), Some("true"));
    replies.send("SUCCESS", "OTDR-1-1", Vec::new()).await.unwrap();

    token.cancel();
    handle.await.unwrap();
}
