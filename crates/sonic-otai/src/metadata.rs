//! Attribute metadata oracle.
//!
//! Every object type declares a static table of [`AttrMetadata`]. The
//! orchestrators query it once at construction to classify fields into
//! create-only, create-and-set, read-only and irrecoverable buckets.

use crate::attrs;
use crate::types::ObjectType;

/// Attribute id within one object type.
pub type AttrId = u32;

/// How an attribute may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    CreateOnly,
    CreateAndSet,
    SetOnly,
    ReadOnly,
}

/// Enum value table: numeric value plus short name (e.g. `ENABLED`).
#[derive(Debug)]
pub struct EnumMetadata {
    pub name: &'static str,
    pub values: &'static [(i32, &'static str)],
}

impl EnumMetadata {
    /// Resolves a short or fully qualified name to its value.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        let short = name
            .strip_prefix(self.name)
            .and_then(|s| s.strip_prefix('_'))
            .unwrap_or(name);
        self.values.iter().find(|(_, n)| *n == short).map(|(v, _)| *v)
    }

    pub fn name_of(&self, value: i32) -> Option<&'static str> {
        self.values.iter().find(|(v, _)| *v == value).map(|(_, n)| *n)
    }
}

/// Value type of an attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttrValueType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I32,
    Double,
    Chardata,
    Enum(&'static EnumMetadata),
    ObjectId,
    /// Callback pointer, never settable from a string.
    Pointer,
}

/// Descriptor of one (object type, attribute id) pair.
#[derive(Debug, Clone, Copy)]
pub struct AttrMetadata {
    pub object_type: ObjectType,
    pub attr_id: AttrId,
    pub name: &'static str,
    pub kebab_name: &'static str,
    pub value_type: AttrValueType,
    pub access: Access,
    pub is_mandatory_on_create: bool,
    pub is_recoverable: bool,
}

impl AttrMetadata {
    pub const fn new(
        object_type: ObjectType,
        attr_id: AttrId,
        name: &'static str,
        kebab_name: &'static str,
        value_type: AttrValueType,
        access: Access,
    ) -> Self {
        Self {
            object_type,
            attr_id,
            name,
            kebab_name,
            value_type,
            access,
            is_mandatory_on_create: false,
            is_recoverable: true,
        }
    }

    pub const fn mandatory(mut self) -> Self {
        self.is_mandatory_on_create = true;
        self
    }

    /// Marks an attribute (e.g. reset) that may only be driven imperatively.
    pub const fn irrecoverable(mut self) -> Self {
        self.is_recoverable = false;
        self
    }

    pub fn is_create_only(&self) -> bool {
        self.access == Access::CreateOnly
    }

    pub fn is_create_and_set(&self) -> bool {
        self.access == Access::CreateAndSet
    }

    pub fn is_set_only(&self) -> bool {
        self.access == Access::SetOnly
    }

    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }
}

/// Full metadata table of an object type.
pub fn object_attr_metadata(object_type: ObjectType) -> &'static [AttrMetadata] {
    match object_type {
        ObjectType::Null => &[],
        ObjectType::Linecard => attrs::linecard::METADATA,
        ObjectType::Port => attrs::port::METADATA,
        ObjectType::Transceiver => attrs::transceiver::METADATA,
        ObjectType::LogicalChannel => attrs::logical_channel::METADATA,
        ObjectType::Otn => attrs::otn::METADATA,
        ObjectType::Ethernet => attrs::ethernet::METADATA,
        ObjectType::PhysicalChannel => attrs::physical_channel::METADATA,
        ObjectType::Och => attrs::och::METADATA,
        ObjectType::Lldp => attrs::lldp::METADATA,
        ObjectType::Assignment => attrs::assignment::METADATA,
        ObjectType::Interface => attrs::interface::METADATA,
        ObjectType::Oa => attrs::oa::METADATA,
        ObjectType::Osc => attrs::osc::METADATA,
        ObjectType::Aps => attrs::aps::METADATA,
        ObjectType::ApsPort => attrs::aps_port::METADATA,
        ObjectType::Attenuator => attrs::attenuator::METADATA,
        ObjectType::Ocm => attrs::ocm::METADATA,
        ObjectType::Otdr => attrs::otdr::METADATA,
    }
}

/// Looks up one attribute descriptor.
pub fn get_attr_metadata(object_type: ObjectType, attr_id: AttrId) -> Option<&'static AttrMetadata> {
    object_attr_metadata(object_type)
        .iter()
        .find(|m| m.attr_id == attr_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::{linecard, transceiver};

    #[test]
    fn test_lookup_metadata() {
        let meta = get_attr_metadata(ObjectType::Linecard, linecard::BOARD_MODE).unwrap();
        assert_eq!(meta.kebab_name, "board-mode");
        assert!(meta.is_create_and_set());
        assert!(get_attr_metadata(ObjectType::Linecard, 9999).is_none());
    }

    #[test]
    fn test_reset_is_irrecoverable() {
        let meta = get_attr_metadata(ObjectType::Transceiver, transceiver::RESET).unwrap();
        assert!(!meta.is_recoverable);
    }

    #[test]
    fn test_kebab_names_unique_per_type() {
        for t in ObjectType::ALL {
            let table = object_attr_metadata(t);
            for (i, a) in table.iter().enumerate() {
                assert_eq!(a.object_type, t, "{} in wrong table", a.name);
                assert!(
                    table[i + 1..].iter().all(|b| b.kebab_name != a.kebab_name && b.attr_id != a.attr_id),
                    "duplicate attribute {} in {}",
                    a.kebab_name,
                    t
                );
            }
        }
    }

    #[test]
    fn test_enum_value_lookup() {
        let meta = get_attr_metadata(ObjectType::Transceiver, transceiver::SWITCH_FLASH_PARTITION).unwrap();
        let AttrValueType::Enum(e) = meta.value_type else {
            panic!("partition should be an enum");
        };
        assert_eq!(e.value_of("B"), Some(1));
        assert_eq!(e.value_of("OTAI_TRANSCEIVER_FLASH_PARTITION_A"), Some(0));
        assert_eq!(e.name_of(1), Some("B"));
        assert_eq!(e.value_of("C"), None);
    }
}
