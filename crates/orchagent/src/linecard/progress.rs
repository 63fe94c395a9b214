//! Object-type completion counting for the linecard pre-configuration phase.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sonic_otai::attrs::linecard;
use sonic_otai::{AttrValue, Attribute, ObjectType, OtaiApi, OtaiObjectId};

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::{audit_log, error_log, info_log};

#[derive(Debug, Default)]
struct ProgressState {
    linecard: Option<OtaiObjectId>,
    total: Option<usize>,
    num: usize,
    stop_issued: bool,
}

/// Counts object types whose bootstrap finished and ends pre-configuration
/// once all declared types are done.
pub struct ConfigProgress {
    hal: Arc<dyn OtaiApi>,
    state: Mutex<ProgressState>,
}

impl ConfigProgress {
    pub fn new(hal: Arc<dyn OtaiApi>) -> Self {
        Self {
            hal,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parent id for every non-linecard create; null until the linecard exists.
    pub fn linecard_oid(&self) -> OtaiObjectId {
        self.state().linecard.unwrap_or(OtaiObjectId::NULL)
    }

    pub fn set_linecard_oid(&self, oid: OtaiObjectId) {
        self.state().linecard = Some(oid);
        self.check();
    }

    /// Declares how many object types will report completion.
    pub fn set_total(&self, total: usize) {
        info_log!("LinecardOrch", "Config total number={}", total);
        self.state().total = Some(total);
        self.check();
    }

    pub fn total(&self) -> Option<usize> {
        self.state().total
    }

    /// Called once by each object type when all its declared objects exist.
    pub fn inc_config_num(&self) {
        self.state().num += 1;
        self.check();
    }

    pub fn config_num(&self) -> usize {
        self.state().num
    }

    pub fn is_pre_configuration_stopped(&self) -> bool {
        self.state().stop_issued
    }

    fn check(&self) {
        let linecard = {
            let mut state = self.state();
            let done = matches!(state.total, Some(total) if state.num >= total);
            match state.linecard {
                Some(oid) if done && !state.stop_issued => {
                    state.stop_issued = true;
                    oid
                }
                _ => return,
            }
        };
        self.stop_pre_configuration(linecard);
        super::on_linecard_active();
    }

    fn stop_pre_configuration(&self, linecard_oid: OtaiObjectId) {
        info_log!("LinecardOrch", "Pre-Config Finished.");
        let attr = Attribute::new(linecard::STOP_PRE_CONFIGURATION, AttrValue::Bool(true));
        let result = self.hal.set_attribute(ObjectType::Linecard, linecard_oid, &attr);

        let record = AuditRecord::new(AuditCategory::HalOperation, "LinecardOrch", "stop_pre_configuration")
            .with_object_id(linecard_oid.serialize())
            .with_object_type("LINECARD");
        match result {
            Ok(()) => {
                audit_log!(record.with_outcome(AuditOutcome::Success));
            }
            Err(e) => {
                error_log!("LinecardOrch", "Failed to notify HAL pre-config finish {}", e);
                audit_log!(record.with_outcome(AuditOutcome::Failure).with_error(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_otai::{HalCall, VirtualOtai};

    fn linecard(hal: &VirtualOtai) -> OtaiObjectId {
        let attrs = [Attribute::new(linecard::LINECARD_TYPE, AttrValue::Enum(0))];
        hal.create_object(ObjectType::Linecard, OtaiObjectId::NULL, &attrs).unwrap()
    }

    #[test]
    fn test_stop_once_total_reached() {
        let hal = Arc::new(VirtualOtai::new());
        let progress = ConfigProgress::new(hal.clone());
        progress.set_linecard_oid(linecard(&hal));

        progress.inc_config_num();
        progress.inc_config_num();
        assert!(!progress.is_pre_configuration_stopped());

        progress.set_total(3);
        assert!(!progress.is_pre_configuration_stopped());
        progress.inc_config_num();
        assert!(progress.is_pre_configuration_stopped());
        progress.inc_config_num();

        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::STOP_PRE_CONFIGURATION), 1);
    }

    #[test]
    fn test_total_after_all_done() {
        let hal = Arc::new(VirtualOtai::new());
        let progress = ConfigProgress::new(hal.clone());
        let oid = linecard(&hal);
        progress.set_linecard_oid(oid);
        progress.inc_config_num();
        progress.set_total(1);

        assert!(hal.calls().contains(&HalCall::Set {
            object_type: ObjectType::Linecard,
            oid,
            attr: Attribute::new(linecard::STOP_PRE_CONFIGURATION, AttrValue::Bool(true)),
        }));
    }

    #[test]
    fn test_waits_for_linecard() {
        let hal = Arc::new(VirtualOtai::new());
        let progress = ConfigProgress::new(hal.clone());
        progress.set_total(0);
        assert!(!progress.is_pre_configuration_stopped());
        assert_eq!(progress.linecard_oid(), OtaiObjectId::NULL);

        progress.set_linecard_oid(linecard(&hal));
        assert!(progress.is_pre_configuration_stopped());
    }
}
