//! In-memory virtual HAL.
//!
//! Stores objects and attribute values in a map, records every call, and can
//! be told to fail specific operations. It backs the integration tests and the
//! `--hal virtual` mode of the daemon.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::OtaiApi;
use crate::attrs::linecard;
use crate::error::{OtaiError, OtaiResult, OtaiStatus};
use crate::metadata::{get_attr_metadata, object_attr_metadata, Access, AttrId};
use crate::types::{ObjectType, OtaiObjectId};
use crate::value::{Attribute, AttrValue, NotificationHandler, OperStatus};

/// One recorded HAL invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HalCall {
    Create {
        object_type: ObjectType,
        oid: OtaiObjectId,
        attrs: Vec<Attribute>,
    },
    Remove {
        object_type: ObjectType,
        oid: OtaiObjectId,
    },
    Set {
        object_type: ObjectType,
        oid: OtaiObjectId,
        attr: Attribute,
    },
    Get {
        object_type: ObjectType,
        oid: OtaiObjectId,
        ids: Vec<AttrId>,
    },
    Flush,
}

#[derive(Debug)]
struct VsObject {
    object_type: ObjectType,
    attrs: HashMap<AttrId, AttrValue>,
}

#[derive(Debug, Default)]
struct VsState {
    next_index: u64,
    objects: HashMap<OtaiObjectId, VsObject>,
    calls: Vec<HalCall>,
    defaults: HashMap<(ObjectType, AttrId), AttrValue>,
    fail_create: HashSet<ObjectType>,
    fail_set: HashSet<(ObjectType, AttrId)>,
    fail_get: HashSet<(ObjectType, AttrId)>,
    fail_flush: bool,
    log_rotations: usize,
}

/// Virtual OTAI implementation.
#[derive(Debug)]
pub struct VirtualOtai {
    state: Mutex<VsState>,
}

impl Default for VirtualOtai {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualOtai {
    /// Every read-only attribute starts at the zero value of its type.
    pub fn new() -> Self {
        let mut state = VsState::default();
        for object_type in ObjectType::ALL {
            for meta in object_attr_metadata(object_type) {
                if meta.access != Access::ReadOnly {
                    continue;
                }
                if let Some(zero) = AttrValue::zero(meta.value_type) {
                    state.defaults.insert((object_type, meta.attr_id), zero);
                }
            }
        }
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, VsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value returned by `get` for an attribute never written.
    pub fn with_default(self, object_type: ObjectType, attr_id: AttrId, value: AttrValue) -> Self {
        self.state().defaults.insert((object_type, attr_id), value);
        self
    }

    pub fn fail_create(&self, object_type: ObjectType) {
        self.state().fail_create.insert(object_type);
    }

    pub fn clear_create_failure(&self, object_type: ObjectType) {
        self.state().fail_create.remove(&object_type);
    }

    pub fn fail_set(&self, object_type: ObjectType, attr_id: AttrId) {
        self.state().fail_set.insert((object_type, attr_id));
    }

    pub fn fail_get(&self, object_type: ObjectType, attr_id: AttrId) {
        self.state().fail_get.insert((object_type, attr_id));
    }

    pub fn fail_flush(&self, fail: bool) {
        self.state().fail_flush = fail;
    }

    /// Snapshot of every recorded call.
    pub fn calls(&self) -> Vec<HalCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of set calls for one attribute of one object type.
    pub fn set_count(&self, object_type: ObjectType, attr_id: AttrId) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, HalCall::Set { object_type: t, attr, .. } if *t == object_type && attr.id == attr_id))
            .count()
    }

    pub fn get_count(&self, object_type: ObjectType, attr_id: AttrId) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, HalCall::Get { object_type: t, ids, .. } if *t == object_type && ids.contains(&attr_id)))
            .count()
    }

    pub fn create_count(&self, object_type: ObjectType) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, HalCall::Create { object_type: t, .. } if *t == object_type))
            .count()
    }

    pub fn removed(&self, object_type: ObjectType) -> Vec<OtaiObjectId> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HalCall::Remove { object_type: t, oid } if *t == object_type => Some(*oid),
                _ => None,
            })
            .collect()
    }

    /// Live objects of a type.
    pub fn objects(&self, object_type: ObjectType) -> Vec<OtaiObjectId> {
        let mut oids: Vec<_> = self
            .state()
            .objects
            .iter()
            .filter(|(_, o)| o.object_type == object_type)
            .map(|(oid, _)| *oid)
            .collect();
        oids.sort();
        oids
    }

    pub fn attr(&self, oid: OtaiObjectId, attr_id: AttrId) -> Option<AttrValue> {
        self.state().objects.get(&oid).and_then(|o| o.attrs.get(&attr_id).cloned())
    }

    pub fn log_rotations(&self) -> usize {
        self.state().log_rotations
    }

    /// Invokes every registered linecard state-change callback.
    ///
    /// The lock is released before the callbacks run.
    pub fn emit_linecard_state_change(&self, status: OperStatus) {
        let handlers: Vec<(OtaiObjectId, NotificationHandler)> = self
            .state()
            .objects
            .iter()
            .filter_map(|(oid, o)| match o.attrs.get(&linecard::LINECARD_STATE_CHANGE_NOTIFY) {
                Some(AttrValue::Notification(h)) => Some((*oid, h.clone())),
                _ => None,
            })
            .collect();
        for (oid, handler) in handlers {
            if let NotificationHandler::LinecardStateChange(f) = handler {
                f(oid, status);
            }
        }
    }

    fn check_writable(object_type: ObjectType, attr: &Attribute, on_create: bool) -> OtaiResult<()> {
        let meta = get_attr_metadata(object_type, attr.id)
            .ok_or_else(|| OtaiError::from_status(OtaiStatus::InvalidAttribute))?;
        let allowed = match meta.access {
            Access::CreateOnly => on_create,
            Access::CreateAndSet => true,
            Access::SetOnly => !on_create,
            Access::ReadOnly => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(OtaiError::invalid_parameter(format!("{} is not writable here", meta.name)))
        }
    }
}

impl OtaiApi for VirtualOtai {
    fn create_object(
        &self,
        object_type: ObjectType,
        _linecard_id: OtaiObjectId,
        attrs: &[Attribute],
    ) -> OtaiResult<OtaiObjectId> {
        let mut state = self.state();
        if state.fail_create.contains(&object_type) {
            return Err(OtaiError::from_status(OtaiStatus::Failure));
        }
        for attr in attrs {
            Self::check_writable(object_type, attr, true)?;
        }
        let missing = object_attr_metadata(object_type)
            .iter()
            .filter(|m| m.is_mandatory_on_create)
            .any(|m| !attrs.iter().any(|a| a.id == m.attr_id));
        if missing {
            return Err(OtaiError::from_status(OtaiStatus::MandatoryAttributeMissing));
        }

        state.next_index += 1;
        let oid = OtaiObjectId::compose(object_type, state.next_index);
        state.objects.insert(
            oid,
            VsObject {
                object_type,
                attrs: attrs.iter().map(|a| (a.id, a.value.clone())).collect(),
            },
        );
        state.calls.push(HalCall::Create {
            object_type,
            oid,
            attrs: attrs.to_vec(),
        });
        log::debug!("vs: created {:?} with {} attributes", oid, attrs.len());
        Ok(oid)
    }

    fn remove_object(&self, object_type: ObjectType, oid: OtaiObjectId) -> OtaiResult<()> {
        let mut state = self.state();
        state.calls.push(HalCall::Remove { object_type, oid });
        match state.objects.remove(&oid) {
            Some(_) => {
                log::debug!("vs: removed {:?}", oid);
                Ok(())
            }
            None => Err(OtaiError::from_status(OtaiStatus::InvalidObjectId)),
        }
    }

    fn set_attribute(&self, object_type: ObjectType, oid: OtaiObjectId, attr: &Attribute) -> OtaiResult<()> {
        let mut state = self.state();
        state.calls.push(HalCall::Set {
            object_type,
            oid,
            attr: attr.clone(),
        });
        if state.fail_set.contains(&(object_type, attr.id)) {
            return Err(OtaiError::from_status(OtaiStatus::Failure));
        }
        Self::check_writable(object_type, attr, false)?;
        let object = state
            .objects
            .get_mut(&oid)
            .ok_or_else(|| OtaiError::from_status(OtaiStatus::InvalidObjectId))?;
        object.attrs.insert(attr.id, attr.value.clone());
        Ok(())
    }

    fn get_attributes(
        &self,
        object_type: ObjectType,
        oid: OtaiObjectId,
        ids: &[AttrId],
    ) -> OtaiResult<Vec<Attribute>> {
        let mut state = self.state();
        state.calls.push(HalCall::Get {
            object_type,
            oid,
            ids: ids.to_vec(),
        });
        let object = state
            .objects
            .get(&oid)
            .ok_or_else(|| OtaiError::from_status(OtaiStatus::InvalidObjectId))?;
        ids.iter()
            .map(|id| {
                if state.fail_get.contains(&(object_type, *id)) {
                    return Err(OtaiError::from_status(OtaiStatus::Failure));
                }
                object
                    .attrs
                    .get(id)
                    .or_else(|| state.defaults.get(&(object_type, *id)))
                    .cloned()
                    .map(|value| Attribute::new(*id, value))
                    .ok_or_else(|| OtaiError::not_found(format!("attribute {} of {}", id, oid)))
            })
            .collect()
    }

    fn flush(&self) -> OtaiResult<()> {
        let mut state = self.state();
        state.calls.push(HalCall::Flush);
        if state.fail_flush {
            return Err(OtaiError::from_status(OtaiStatus::Failure));
        }
        Ok(())
    }

    fn perform_log_rotate(&self) {
        self.state().log_rotations += 1;
    }
}
