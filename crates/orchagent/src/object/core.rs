//! Attribute translation and HAL access shared by every object orchestrator.

use std::collections::BTreeMap;
use std::sync::Arc;

use sonic_orch_common::{DbConnector, DbResult, FieldValue, NotificationProducer, Table};
use sonic_otai::{
    deserialize_attr_value, serialize_attr_value, AttrId, Attribute, ObjectApi, OtaiError, OtaiObjectId,
    OtaiResult, OtaiStatus,
};

use super::descriptor::AttrClassification;
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::fsm::OrchFsm;
use crate::tables::{operation_result_channel, reply};
use crate::{audit_log, debug_log, error_log, info_log, warn_log};

/// HAL binding, attribute classification and STATE row of one object type.
pub struct ObjectCore {
    name: &'static str,
    api: ObjectApi,
    attrs: AttrClassification,
    fsm: Arc<OrchFsm>,
    state_db: Arc<dyn DbConnector>,
    state_table: Table,
    cached_fields: &'static [&'static str],
}

impl ObjectCore {
    pub fn new(
        name: &'static str,
        api: ObjectApi,
        attrs: AttrClassification,
        fsm: Arc<OrchFsm>,
        state_db: Arc<dyn DbConnector>,
        cached_fields: &'static [&'static str],
    ) -> Self {
        let state_table = Table::new(Arc::clone(&state_db), api.object_type().short_name());
        Self {
            name,
            api,
            attrs,
            fsm,
            state_db,
            state_table,
            cached_fields,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn api(&self) -> &ObjectApi {
        &self.api
    }

    pub fn attrs(&self) -> &AttrClassification {
        &self.attrs
    }

    pub fn state_db(&self) -> &Arc<dyn DbConnector> {
        &self.state_db
    }

    pub fn state_table(&self) -> &Table {
        &self.state_table
    }

    /// Turns a declarative field into a typed attribute.
    pub fn translate(&self, field: &str, value: &str) -> OtaiResult<Attribute> {
        let id = self
            .attrs
            .config_id(field)
            .ok_or_else(|| OtaiError::invalid_parameter(format!("Unrecognized attr, {}|{}", self.name, field)))?;
        self.translate_id(id, value)
    }

    fn translate_id(&self, id: AttrId, value: &str) -> OtaiResult<Attribute> {
        let meta = self
            .api
            .metadata(id)
            .ok_or_else(|| OtaiError::internal(format!("Unable to get {} metadata, attr={}", self.name, id)))?;
        let value = deserialize_attr_value(value, meta)?;
        Ok(Attribute::new(id, value))
    }

    /// Sets one create-and-set attribute on `oid`.
    pub fn set_attr(&self, oid: OtaiObjectId, field: &str, value: &str) -> OtaiResult<()> {
        let id = self
            .attrs
            .create_and_set_id(field)
            .ok_or_else(|| OtaiError::invalid_parameter(format!("Unsupported attr, {}|{}", self.name, field)))?;
        let attr = self.translate_id(id, value)?;
        self.api.set(oid, &attr)?;
        info_log!(self.name, "Set {} attr, oid:{} field={}, value={}", self.name, oid, field, value);
        Ok(())
    }

    /// Reads one read-only attribute of `oid` in its string form.
    pub fn get_attr(&self, oid: OtaiObjectId, field: &str) -> OtaiResult<String> {
        let id = self
            .attrs
            .read_only_id(field)
            .ok_or_else(|| OtaiError::invalid_parameter(format!("Unsupported attr, {}|{}", self.name, field)))?;
        let meta = self
            .api
            .metadata(id)
            .ok_or_else(|| OtaiError::internal(format!("Unable to get {} metadata, attr={}", self.name, id)))?;
        let attr = self
            .api
            .get(oid, &[id])?
            .into_iter()
            .next()
            .ok_or_else(|| OtaiError::not_found(format!("{} of {}", field, oid)))?;
        Ok(serialize_attr_value(meta, &attr.value))
    }

    /// Applies declarative updates to an existing object and publishes one
    /// operation result per field on `<field>-<operation_id>`.
    ///
    /// Returns false when anything failed, including a missing oid or an FSM
    /// that is not working.
    pub async fn set_attrs(
        &self,
        key: &str,
        oid: Option<OtaiObjectId>,
        fields: &BTreeMap<String, String>,
        operation_id: &str,
    ) -> DbResult<bool> {
        if !self.fsm.is_working() {
            error_log!(self.name, "Orch isn't in working status");
            return Ok(false);
        }
        let Some(oid) = oid else {
            error_log!(self.name, "Failed to get oid, key={}|{}", self.name, key);
            return Ok(false);
        };

        let mut all_ok = true;
        for (field, value) in fields {
            if self.attrs.is_irrecoverable(field) {
                warn_log!(self.name, "Skip irrecoverable attr {}|{} on config path", key, field);
                continue;
            }
            debug_log!(self.name, "set field={} value={}", field, value);

            let (status, message) = match self.set_attr(oid, field, value) {
                Ok(()) => {
                    if self.cached_fields.contains(&field.as_str()) {
                        self.state_table.hset(key, field, value).await?;
                    }
                    (OtaiStatus::Success, format!("Set {} {} to {}", key, field, value))
                }
                Err(e) => {
                    error_log!(
                        self.name,
                        "Failed to set {}|{} {} to {}, status={}",
                        self.name,
                        key,
                        field,
                        value,
                        e
                    );
                    all_ok = false;
                    (e.status(), format!("Failed to set {} {} to {}", key, field, value))
                }
            };
            self.publish_operation_result(&operation_result_channel(field, operation_id), status, &message)
                .await?;
        }
        Ok(all_ok)
    }

    /// Applies an imperative `set`; every field must be irrecoverable.
    ///
    /// Returns the reply status.
    pub fn request_set(&self, key: &str, oid: OtaiObjectId, values: &[FieldValue]) -> &'static str {
        let record = AuditRecord::new(AuditCategory::AdminAction, self.name, "imperative_set")
            .with_object_id(key)
            .with_object_type(self.api.object_type().short_name())
            .with_details(serde_json::json!({ "fields": values }));

        for (field, value) in values {
            if !self.attrs.is_irrecoverable(field) {
                error_log!(self.name, "Field {} can not be set by notification", field);
                audit_log!(record.with_outcome(AuditOutcome::Denied));
                return reply::FAILED;
            }
            if let Err(e) = self.set_attr(oid, field, value) {
                error_log!(self.name, "Failed to set {} {} to {}, {}", key, field, value, e);
                audit_log!(record.with_error(e.to_string()));
                return reply::FAILED;
            }
        }
        audit_log!(record.with_outcome(AuditOutcome::Success));
        reply::SUCCESS
    }

    /// Answers an imperative `get` in place; every field must be read-only.
    pub fn request_get(&self, oid: OtaiObjectId, values: &mut [FieldValue]) -> &'static str {
        for (field, value) in values.iter_mut() {
            match self.get_attr(oid, field) {
                Ok(v) => *value = v,
                Err(e) => {
                    error_log!(self.name, "Failed to get attr, field={}, status={}", field, e);
                    return reply::FAILED;
                }
            }
        }
        reply::SUCCESS
    }

    /// Publishes `(status code, message)` on a STATE_DB result channel.
    pub async fn publish_operation_result(&self, channel: &str, status: OtaiStatus, message: &str) -> DbResult<()> {
        let producer = NotificationProducer::new(Arc::clone(&self.state_db), channel);
        let clients = producer.send(&status.code().to_string(), message, Vec::new()).await?;
        debug_log!(
            self.name,
            "publishresult {}, {} to {} client on channel {}",
            status.code(),
            message,
            clients,
            channel
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::OrchState;
    use sonic_orch_common::{DbId, MemoryDb, NotificationConsumer};
    use sonic_otai::attrs::och;
    use sonic_otai::{AttrValue, ObjectType, VirtualOtai};
    use std::time::Duration;

    struct Fixture {
        hal: Arc<VirtualOtai>,
        state_db: Arc<dyn DbConnector>,
        fsm: Arc<OrchFsm>,
        core: ObjectCore,
    }

    fn fixture() -> Fixture {
        let hal = Arc::new(VirtualOtai::new());
        let api = ObjectApi::new(ObjectType::Och, hal.clone());
        let attrs = AttrClassification::build(
            "OchOrch",
            &api,
            &[och::PORT_TYPE, och::PORT_ID, och::FREQUENCY, och::TARGET_OUTPUT_POWER],
            &[],
        );
        let state_db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::StateDb));
        let fsm = Arc::new(OrchFsm::new(OrchState::Work));
        let core = ObjectCore::new("OchOrch", api, attrs, fsm.clone(), state_db.clone(), &["frequency"]);
        Fixture {
            hal,
            state_db,
            fsm,
            core,
        }
    }

    fn create_och(f: &Fixture) -> OtaiObjectId {
        let attrs = vec![
            f.core.translate("port-type", "LINE").unwrap(),
            f.core.translate("port-id", "1").unwrap(),
        ];
        f.core.api().create(OtaiObjectId::NULL, &attrs).unwrap()
    }

    #[test]
    fn test_translate() {
        let f = fixture();
        let attr = f.core.translate("frequency", "193100000").unwrap();
        assert_eq!(attr, Attribute::new(och::FREQUENCY, AttrValue::U64(193_100_000)));

        assert!(matches!(
            f.core.translate("wavelength", "1"),
            Err(OtaiError::InvalidParameter { .. })
        ));
        assert!(f.core.translate("frequency", "fast").is_err());
    }

    #[test]
    fn test_set_attr_requires_create_and_set() {
        let f = fixture();
        let oid = create_och(&f);
        assert!(f.core.set_attr(oid, "port-id", "2").is_err());
        f.core.set_attr(oid, "target-output-power", "1.5").unwrap();
        assert_eq!(f.hal.attr(oid, och::TARGET_OUTPUT_POWER), Some(AttrValue::Double(1.5)));
    }

    #[tokio::test]
    async fn test_set_attrs_publishes_results_and_caches() {
        let f = fixture();
        let oid = create_och(&f);
        let mut ok_channel = NotificationConsumer::new(&f.state_db, "frequency-42").await.unwrap();
        let mut bad_channel = NotificationConsumer::new(&f.state_db, "target-output-power-42")
            .await
            .unwrap();
        f.hal.fail_set(ObjectType::Och, och::TARGET_OUTPUT_POWER);

        let fields = BTreeMap::from([
            ("frequency".to_string(), "193100000".to_string()),
            ("target-output-power".to_string(), "2.0".to_string()),
        ]);
        let ok = f.core.set_attrs("OCH-1-1-L1", Some(oid), &fields, "42").await.unwrap();
        assert!(!ok);

        let msg = ok_channel.recv_timeout(Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.op, "0");
        assert_eq!(msg.data, "Set OCH-1-1-L1 frequency to 193100000");
        let msg = bad_channel.recv_timeout(Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.op, "-1");
        assert_eq!(msg.data, "Failed to set OCH-1-1-L1 target-output-power to 2.0");

        let cached = f.state_db.hget("OCH", "OCH-1-1-L1", "frequency").await.unwrap();
        assert_eq!(cached.as_deref(), Some("193100000"));
    }

    #[tokio::test]
    async fn test_set_attrs_requires_work_and_oid() {
        let f = fixture();
        let oid = create_och(&f);
        let fields = BTreeMap::from([("frequency".to_string(), "1".to_string())]);

        assert!(!f.core.set_attrs("OCH-1-1-L1", None, &fields, "").await.unwrap());
        f.fsm.set(OrchState::Pause);
        assert!(!f.core.set_attrs("OCH-1-1-L1", Some(oid), &fields, "").await.unwrap());
        assert_eq!(f.hal.set_count(ObjectType::Och, och::FREQUENCY), 0);
    }
}
