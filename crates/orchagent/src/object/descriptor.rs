//! Static description of an object type and the attribute classification
//! derived from HAL metadata.

use std::collections::BTreeMap;

use sonic_otai::{AttrId, ObjectApi, ObjectType};

use crate::tables::{fields, reply};
use crate::warn_log;

/// How the imperative request channel of an object type behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStyle {
    /// `get` of read-only and `set` of irrecoverable attributes; FAILED while
    /// the FSM is not working.
    Generic,
    /// `set` of irrecoverable scan triggers only; UNAVAILABLE while the FSM is
    /// not working so scanners can back off and retry.
    Scan,
}

/// Everything the generic engine needs to know about one object type.
#[derive(Debug)]
pub struct ObjectDescriptor {
    pub orch_name: &'static str,
    pub object_type: ObjectType,
    /// Attributes accepted on the declarative path.
    pub config_attrs: &'static [AttrId],
    /// Attributes readable through the request channel.
    pub read_only_attrs: &'static [AttrId],
    /// Non-HAL fields persisted verbatim to the STATE row.
    pub auxiliary_fields: &'static [&'static str],
    /// Fields mirrored into the STATE row when set successfully.
    pub cached_fields: &'static [&'static str],
    /// Auxiliary fields applied (and acknowledged) after configuration completes.
    pub self_process_fields: &'static [&'static str],
    /// Subscribe to the STATE table for presence changes.
    pub watch_presence: bool,
    pub request_style: RequestStyle,
}

const DEFAULT_SELF_PROCESS: &[&str] = &[fields::NAME];

impl ObjectDescriptor {
    pub const fn new(orch_name: &'static str, object_type: ObjectType, config_attrs: &'static [AttrId]) -> Self {
        Self {
            orch_name,
            object_type,
            config_attrs,
            read_only_attrs: &[],
            auxiliary_fields: &[],
            cached_fields: &[],
            self_process_fields: DEFAULT_SELF_PROCESS,
            watch_presence: false,
            request_style: RequestStyle::Generic,
        }
    }

    pub const fn auxiliary(mut self, fields: &'static [&'static str]) -> Self {
        self.auxiliary_fields = fields;
        self
    }

    pub const fn read_only(mut self, attrs: &'static [AttrId]) -> Self {
        self.read_only_attrs = attrs;
        self
    }

    pub const fn cached(mut self, fields: &'static [&'static str]) -> Self {
        self.cached_fields = fields;
        self
    }

    pub const fn self_processed(mut self, fields: &'static [&'static str]) -> Self {
        self.self_process_fields = fields;
        self
    }

    pub const fn with_presence(mut self) -> Self {
        self.watch_presence = true;
        self
    }

    pub const fn request_style(mut self, style: RequestStyle) -> Self {
        self.request_style = style;
        self
    }

    pub fn is_auxiliary(&self, field: &str) -> bool {
        self.auxiliary_fields.contains(&field)
    }

    /// Reply sent when a request arrives while the FSM is not working.
    pub fn not_ready_reply(&self) -> &'static str {
        match self.request_style {
            RequestStyle::Generic => reply::FAILED,
            RequestStyle::Scan => reply::UNAVAILABLE,
        }
    }
}

/// Field name to attribute id maps built from HAL metadata.
#[derive(Debug, Default, Clone)]
pub struct AttrClassification {
    create_only: BTreeMap<String, AttrId>,
    create_and_set: BTreeMap<String, AttrId>,
    mandatory: BTreeMap<String, AttrId>,
    irrecoverable: BTreeMap<String, AttrId>,
    read_only: BTreeMap<String, AttrId>,
}

impl AttrClassification {
    /// Classifies `config_attrs` and `read_only_attrs`; attributes the HAL has
    /// no metadata for, or read-only ones on the config list, are skipped.
    pub fn build(orch: &str, api: &ObjectApi, config_attrs: &[AttrId], read_only_attrs: &[AttrId]) -> Self {
        let mut classification = Self::default();

        for &id in config_attrs {
            let Some(meta) = api.metadata(id) else {
                warn_log!(orch, "Attribute {} of {} has no metadata", id, api.object_type());
                continue;
            };
            let name = meta.kebab_name.to_string();
            if meta.is_mandatory_on_create {
                classification.mandatory.insert(name.clone(), id);
            }
            if meta.is_create_only() {
                classification.create_only.insert(name.clone(), id);
            } else if meta.is_create_and_set() || meta.is_set_only() {
                classification.create_and_set.insert(name.clone(), id);
            } else {
                warn_log!(orch, "Attribute {} cannot be configured", meta.name);
                continue;
            }
            if !meta.is_recoverable {
                classification.irrecoverable.insert(name, id);
            }
        }

        for &id in read_only_attrs {
            match api.metadata(id) {
                Some(meta) => {
                    classification.read_only.insert(meta.kebab_name.to_string(), id);
                }
                None => warn_log!(orch, "Attribute {} of {} has no metadata", id, api.object_type()),
            }
        }

        classification
    }

    pub fn create_only_id(&self, field: &str) -> Option<AttrId> {
        self.create_only.get(field).copied()
    }

    pub fn create_and_set_id(&self, field: &str) -> Option<AttrId> {
        self.create_and_set.get(field).copied()
    }

    pub fn read_only_id(&self, field: &str) -> Option<AttrId> {
        self.read_only.get(field).copied()
    }

    pub fn is_mandatory(&self, field: &str) -> bool {
        self.mandatory.contains_key(field)
    }

    pub fn is_irrecoverable(&self, field: &str) -> bool {
        self.irrecoverable.contains_key(field)
    }

    /// Id of a configurable field, create-and-set first.
    pub fn config_id(&self, field: &str) -> Option<AttrId> {
        self.create_and_set_id(field).or_else(|| self.create_only_id(field))
    }

    pub fn is_config_field(&self, field: &str) -> bool {
        self.config_id(field).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_otai::attrs::{linecard, transceiver};
    use sonic_otai::VirtualOtai;
    use std::sync::Arc;

    fn api(object_type: ObjectType) -> ObjectApi {
        ObjectApi::new(object_type, Arc::new(VirtualOtai::new()))
    }

    #[test]
    fn test_classify_transceiver() {
        let c = AttrClassification::build(
            "TransceiverOrch",
            &api(ObjectType::Transceiver),
            &[
                transceiver::PORT_TYPE,
                transceiver::PORT_ID,
                transceiver::ENABLED,
                transceiver::RESET,
                transceiver::PRESENT,
            ],
            &[transceiver::UPGRADE_STATE],
        );

        assert_eq!(c.create_only_id("port-type"), Some(transceiver::PORT_TYPE));
        assert!(c.is_mandatory("port-id"));
        assert_eq!(c.create_and_set_id("enabled"), Some(transceiver::ENABLED));
        assert_eq!(c.create_and_set_id("reset"), Some(transceiver::RESET));
        assert!(c.is_irrecoverable("reset"));
        assert!(!c.is_irrecoverable("enabled"));
        // Read-only attributes are never configurable.
        assert!(!c.is_config_field("present"));
        assert_eq!(c.read_only_id("upgrade-state"), Some(transceiver::UPGRADE_STATE));
    }

    #[test]
    fn test_classify_linecard_pre_configuration() {
        let c = AttrClassification::build(
            "LinecardOrch",
            &api(ObjectType::Linecard),
            &[linecard::LINECARD_TYPE, linecard::START_PRE_CONFIGURATION],
            &[],
        );
        assert!(c.is_mandatory("linecard-type"));
        assert_eq!(c.config_id("start-pre-configuration"), Some(linecard::START_PRE_CONFIGURATION));
        assert!(!c.is_irrecoverable("start-pre-configuration"));
    }

    #[test]
    fn test_descriptor_defaults() {
        const DESC: ObjectDescriptor = ObjectDescriptor::new("OcmOrch", ObjectType::Ocm, &[])
            .request_style(RequestStyle::Scan);
        assert_eq!(DESC.self_process_fields, &["name"]);
        assert_eq!(DESC.not_ready_reply(), "UNAVAILABLE");
        assert!(!DESC.watch_presence);
    }
}
