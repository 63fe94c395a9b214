//! The HAL boundary.
//!
//! [`OtaiApi`] is the single capability trait behind which the vendor
//! library sits. [`ObjectApi`] binds it to one object type, which is what a
//! per-type orchestrator holds instead of a table of function pointers.

use std::sync::Arc;

use crate::error::OtaiResult;
use crate::metadata::{get_attr_metadata, AttrId, AttrMetadata};
use crate::types::{ObjectType, OtaiObjectId};
use crate::value::Attribute;

/// Create/remove/set/get for every object type plus the metadata oracle.
pub trait OtaiApi: Send + Sync {
    /// Creates an object under `linecard_id` (null for the linecard itself).
    fn create_object(
        &self,
        object_type: ObjectType,
        linecard_id: OtaiObjectId,
        attrs: &[Attribute],
    ) -> OtaiResult<OtaiObjectId>;

    fn remove_object(&self, object_type: ObjectType, oid: OtaiObjectId) -> OtaiResult<()>;

    fn set_attribute(&self, object_type: ObjectType, oid: OtaiObjectId, attr: &Attribute) -> OtaiResult<()>;

    fn get_attributes(
        &self,
        object_type: ObjectType,
        oid: OtaiObjectId,
        ids: &[AttrId],
    ) -> OtaiResult<Vec<Attribute>>;

    fn attr_metadata(&self, object_type: ObjectType, attr_id: AttrId) -> Option<&'static AttrMetadata> {
        get_attr_metadata(object_type, attr_id)
    }

    /// Flushes any buffered writes towards the device.
    fn flush(&self) -> OtaiResult<()> {
        Ok(())
    }

    /// Reopens the HAL recording/log file after a rotation request.
    fn perform_log_rotate(&self) {}
}

/// An [`OtaiApi`] bound to one object type.
#[derive(Clone)]
pub struct ObjectApi {
    object_type: ObjectType,
    api: Arc<dyn OtaiApi>,
}

impl ObjectApi {
    pub fn new(object_type: ObjectType, api: Arc<dyn OtaiApi>) -> Self {
        Self { object_type, api }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn hal(&self) -> &Arc<dyn OtaiApi> {
        &self.api
    }

    pub fn create(&self, linecard_id: OtaiObjectId, attrs: &[Attribute]) -> OtaiResult<OtaiObjectId> {
        self.api.create_object(self.object_type, linecard_id, attrs)
    }

    pub fn remove(&self, oid: OtaiObjectId) -> OtaiResult<()> {
        self.api.remove_object(self.object_type, oid)
    }

    pub fn set(&self, oid: OtaiObjectId, attr: &Attribute) -> OtaiResult<()> {
        self.api.set_attribute(self.object_type, oid, attr)
    }

    pub fn get(&self, oid: OtaiObjectId, ids: &[AttrId]) -> OtaiResult<Vec<Attribute>> {
        self.api.get_attributes(self.object_type, oid, ids)
    }

    pub fn metadata(&self, attr_id: AttrId) -> Option<&'static AttrMetadata> {
        self.api.attr_metadata(self.object_type, attr_id)
    }
}

impl std::fmt::Debug for ObjectApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectApi").field("object_type", &self.object_type).finish()
    }
}
