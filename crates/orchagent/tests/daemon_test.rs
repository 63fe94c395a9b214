//! End-to-end tests driving the daemon over in-memory databases and the
//! virtual HAL.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sonic_orch_common::{FieldValue, KeyOpFieldsValues, NotificationConsumer, NotificationMessage};
use sonic_otai::attrs::{linecard, otdr, port};
use sonic_otai::{AttrValue, ObjectType, OtaiObjectId, VirtualOtai};
use sonic_otn_orchagent::context::{ContextOptions, Databases};
use sonic_otn_orchagent::flex_counter::CounterType;
use sonic_otn_orchagent::linecard::LinecardOrchConfig;
use sonic_otn_orchagent::tables::FLEX_COUNTER_TABLE;
use sonic_otn_orchagent::{OrchDaemon, OrchDaemonConfig, OrchState, SharedRuntimeContext};

fn fv(f: &str, v: &str) -> FieldValue {
    (f.to_string(), v.to_string())
}

struct Agent {
    hal: Arc<VirtualOtai>,
    ctx: SharedRuntimeContext,
    daemon: OrchDaemon,
}

impl Agent {
    /// Agent whose linecard is already reported ACTIVE in STATE_DB.
    async fn start() -> Self {
        let hal = Arc::new(VirtualOtai::new());
        let ctx = SharedRuntimeContext::new(hal.clone(), Databases::in_memory(), ContextOptions::default())
            .await
            .unwrap();
        ctx.dbs
            .state
            .hset("LINECARD", "LINECARD-1-0", &[fv("oper-status", "ACTIVE")])
            .await
            .unwrap();

        let config = OrchDaemonConfig {
            select_timeout_ms: 20,
            poll_interval_ms: 1,
            batch_size: 128,
        };
        let linecard = LinecardOrchConfig {
            board_mode_poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let daemon = OrchDaemon::with_default_orchs(ctx.clone(), config, linecard)
            .await
            .unwrap();
        Self { hal, ctx, daemon }
    }

    async fn push(&self, table: &str, entry: KeyOpFieldsValues) {
        self.ctx.dbs.appl.push_change(table, entry).await.unwrap();
    }

    /// Runs the loop until an iteration finds nothing to do.
    async fn settle(&mut self) {
        while self.daemon.run_once().await.unwrap() {}
    }

    /// Oid of `key`, found through the COUNTERS_DB name map.
    async fn oid_of(&self, object_type: ObjectType, key: &str) -> OtaiObjectId {
        let table = format!("COUNTERS_{}_NAME_MAP", object_type.short_name());
        for oid in self.hal.objects(object_type) {
            let name = self.ctx.dbs.counters.hget(&table, "", &oid.serialize()).await.unwrap();
            if name.as_deref() == Some(key) {
                return oid;
            }
        }
        panic!("{} has no oid", key);
    }

    async fn request(&mut self, channel: &str, reply: &str, msg: NotificationMessage) -> NotificationMessage {
        let mut replies = NotificationConsumer::new(&self.ctx.dbs.appl, reply).await.unwrap();
        self.ctx.dbs.appl.publish(channel, &msg).await.unwrap();
        self.settle().await;
        replies.recv_timeout(Duration::from_millis(100)).await.unwrap()
    }
}

fn port_row(i: u32, port_type: &str) -> KeyOpFieldsValues {
    KeyOpFieldsValues::set(
        format!("PORT-1-{}", i),
        vec![
            fv("index", &i.to_string()),
            fv("port-type", port_type),
            fv("port-id", &i.to_string()),
            fv("admin-state", "ENABLED"),
        ],
    )
}

fn config_done(count: usize) -> KeyOpFieldsValues {
    KeyOpFieldsValues::set("ConfigDone", vec![fv("count", &count.to_string())])
}

async fn bootstrap_ports(agent: &mut Agent) {
    agent
        .push(
            "LINECARD",
            KeyOpFieldsValues::set("LINECARD-1-0", vec![fv("linecard-type", "P230C"), fv("object-count", "1")]),
        )
        .await;
    agent.push("PORT", config_done(2)).await;
    agent.push("PORT", port_row(1, "LINE_IN")).await;
    agent.push("PORT", port_row(2, "LINE_OUT")).await;
    agent.settle().await;
}

#[tokio::test]
async fn test_bootstrap_ends_pre_configuration() {
    let mut agent = Agent::start().await;
    assert_eq!(agent.ctx.fsm.get(), OrchState::Ready);

    bootstrap_ports(&mut agent).await;

    assert_eq!(agent.ctx.fsm.get(), OrchState::Work);
    assert_eq!(agent.hal.create_count(ObjectType::Linecard), 1);
    assert_eq!(agent.hal.create_count(ObjectType::Port), 2);
    assert_eq!(agent.ctx.progress.config_num(), 1);
    assert!(agent.ctx.progress.is_pre_configuration_stopped());
    assert_eq!(
        agent.hal.set_count(ObjectType::Linecard, linecard::STOP_PRE_CONFIGURATION),
        1
    );

    for port in agent.hal.objects(ObjectType::Port) {
        assert_eq!(agent.hal.attr(port, port::ADMIN_STATE), Some(AttrValue::Enum(0)));
    }
}

#[tokio::test]
async fn test_port_gauge_follows_direction() {
    let mut agent = Agent::start().await;
    bootstrap_ports(&mut agent).await;

    let line_in = agent.oid_of(ObjectType::Port, "PORT-1-1").await;
    let line_out = agent.oid_of(ObjectType::Port, "PORT-1-2").await;

    let gauge = |oid: OtaiObjectId| format!("1S_STAT_GAUGE|{}", oid.serialize());
    let row = agent.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &gauge(line_in)).await.unwrap();
    assert_eq!(row, vec![fv(&CounterType::InportGauge.id_list_field(), "")]);
    let row = agent.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &gauge(line_out)).await.unwrap();
    assert_eq!(row, vec![fv(&CounterType::OutportGauge.id_list_field(), "")]);
}

#[tokio::test]
async fn test_update_after_bootstrap_publishes_result() {
    let mut agent = Agent::start().await;
    bootstrap_ports(&mut agent).await;
    let oid = agent.oid_of(ObjectType::Port, "PORT-1-1").await;

    let mut result = NotificationConsumer::new(&agent.ctx.dbs.state, "admin-state-9").await.unwrap();
    agent
        .push(
            "PORT",
            KeyOpFieldsValues::set("PORT-1-1", vec![fv("admin-state", "DISABLED"), fv("operation-id", "9")]),
        )
        .await;
    agent.settle().await;

    assert_eq!(agent.hal.attr(oid, port::ADMIN_STATE), Some(AttrValue::Enum(1)));
    let msg = result.recv_timeout(Duration::from_millis(100)).await.unwrap();
    assert_eq!(msg.op, "0");
}

#[tokio::test]
async fn test_imperative_get_of_writable_field_fails() {
    let mut agent = Agent::start().await;
    bootstrap_ports(&mut agent).await;

    let reply = agent
        .request(
            "PORT_NOTIFICATION",
            "PORT_REPLY",
            NotificationMessage::new("get", "PORT-1-1", vec![fv("admin-state", "")]),
        )
        .await;
    assert_eq!(reply.op, "FAILED");

    let reply = agent
        .request(
            "PORT_NOTIFICATION",
            "PORT_REPLY",
            NotificationMessage::new("get", "PORT-1-1", vec![fv("oper-status", "")]),
        )
        .await;
    assert_eq!(reply.op, "SUCCESS");
}

#[tokio::test]
async fn test_diag_reports_fsm_state() {
    let mut agent = Agent::start().await;
    let reply = agent
        .request("SWSS_DIAG_CHANNEL", "SWSS_DIAG_REPLY", NotificationMessage::new("state", "", Vec::new()))
        .await;
    assert_eq!(reply.values, vec![fv("state", "ready")]);

    bootstrap_ports(&mut agent).await;
    let reply = agent
        .request("SWSS_DIAG_CHANNEL", "SWSS_DIAG_REPLY", NotificationMessage::new("state", "", Vec::new()))
        .await;
    assert_eq!(reply.op, "SUCCESS");
    assert_eq!(reply.values, vec![fv("state", "work")]);
}

#[tokio::test]
async fn test_otdr_scan_unavailable_until_work() {
    let mut agent = Agent::start().await;
    let scan = || NotificationMessage::new("set", "OTDR-1-1", vec![fv("scan", "true")]);

    let reply = agent.request("OTDR_NOTIFICATION", "OTDR_REPLY", scan()).await;
    assert_eq!(reply.op, "UNAVAILABLE");

    agent
        .push("LINECARD", KeyOpFieldsValues::set("LINECARD-1-0", vec![fv("linecard-type", "P230C")]))
        .await;
    agent.push("OTDR", config_done(1)).await;
    agent
        .push(
            "OTDR",
            KeyOpFieldsValues::set(
                "OTDR-1-1",
                vec![fv("index", "1"), fv("id", "1"), fv("name", "otdr-a"), fv("period", "60")],
            ),
        )
        .await;
    agent.settle().await;
    assert_eq!(agent.hal.create_count(ObjectType::Otdr), 1);
    let period = agent.ctx.dbs.state.hget("OTDR", "OTDR-1-1", "period").await.unwrap();
    assert_eq!(period.as_deref(), Some("60"));

    let reply = agent.request("OTDR_NOTIFICATION", "OTDR_REPLY", scan()).await;
    assert_eq!(reply.op, "SUCCESS");
    assert_eq!(agent.hal.set_count(ObjectType::Otdr, otdr::SCAN), 1);

    // Scan-style objects answer no imperative get.
    let reply = agent
        .request(
            "OTDR_NOTIFICATION",
            "OTDR_REPLY",
            NotificationMessage::new("get", "OTDR-1-1", vec![fv("scan", "")]),
        )
        .await;
    assert_eq!(reply.op, "FAILED");
}

#[tokio::test]
async fn test_transceiver_absence_reaches_hosted_channels() {
    let mut agent = Agent::start().await;
    agent
        .push("LINECARD", KeyOpFieldsValues::set("LINECARD-1-0", vec![fv("linecard-type", "P230C")]))
        .await;
    agent.push("TRANSCEIVER", config_done(1)).await;
    agent
        .push(
            "TRANSCEIVER",
            KeyOpFieldsValues::set(
                "TRANSCEIVER-1-1-L1",
                vec![
                    fv("index", "1"),
                    fv("port-type", "LINE"),
                    fv("port-id", "1"),
                    fv("och", "OCH-1-1-L1"),
                    fv("physical-channel", "PHYSICALCHANNEL-1-1-L1-1,PHYSICALCHANNEL-1-1-L1-2"),
                ],
            ),
        )
        .await;
    agent.settle().await;
    let oid = agent.oid_of(ObjectType::Transceiver, "TRANSCEIVER-1-1-L1").await;

    agent
        .ctx
        .dbs
        .state
        .push_change(
            "TRANSCEIVER",
            KeyOpFieldsValues::set("TRANSCEIVER-1-1-L1", vec![fv("present", "NOT_PRESENT")]),
        )
        .await
        .unwrap();
    agent.settle().await;

    for (table, key) in [
        ("OCH", "OCH-1-1-L1"),
        ("PHYSICALCHANNEL", "PHYSICALCHANNEL-1-1-L1-1"),
        ("PHYSICALCHANNEL", "PHYSICALCHANNEL-1-1-L1-2"),
    ] {
        let present = agent.ctx.dbs.state.hget(table, key, "present").await.unwrap();
        assert_eq!(present.as_deref(), Some("NOT_PRESENT"), "{}|{}", table, key);
    }

    let status = format!("1S_STAT_STATUS|{}", oid.serialize());
    let row = agent.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &status).await.unwrap();
    assert_eq!(
        row,
        vec![fv(
            &CounterType::TransceiverStatus.id_list_field(),
            "OTAI_TRANSCEIVER_ATTR_PRESENT"
        )]
    );
    let gauge = format!("1S_STAT_GAUGE|{}", oid.serialize());
    assert!(agent.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &gauge).await.unwrap().is_empty());
}
