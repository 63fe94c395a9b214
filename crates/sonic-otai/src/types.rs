//! OTAI object types and object ids.
//!
//! Object ids are opaque 64-bit handles handed out by the HAL. The virtual HAL
//! encodes the object type in the top 16 bits the same way a real OTAI
//! redis layer does, so [`OtaiObjectId::object_type`] works for ids it issued.

use std::fmt;
use std::str::FromStr;

/// Raw OTAI object ID type (matches otai_object_id_t in C).
pub type RawOtaiObjectId = u64;

const OBJECT_TYPE_SHIFT: u32 = 48;
const OBJECT_INDEX_MASK: u64 = (1 << OBJECT_TYPE_SHIFT) - 1;

/// Hardware object classes known to the line card.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Null = 0,
    Linecard = 1,
    Port = 2,
    Transceiver = 3,
    LogicalChannel = 4,
    Otn = 5,
    Ethernet = 6,
    PhysicalChannel = 7,
    Och = 8,
    Lldp = 9,
    Assignment = 10,
    Interface = 11,
    Oa = 12,
    Osc = 13,
    Aps = 14,
    ApsPort = 15,
    Attenuator = 16,
    Ocm = 17,
    Otdr = 18,
}

impl ObjectType {
    /// Every real object type, in declaration order.
    pub const ALL: [ObjectType; 18] = [
        ObjectType::Linecard,
        ObjectType::Port,
        ObjectType::Transceiver,
        ObjectType::LogicalChannel,
        ObjectType::Otn,
        ObjectType::Ethernet,
        ObjectType::PhysicalChannel,
        ObjectType::Och,
        ObjectType::Lldp,
        ObjectType::Assignment,
        ObjectType::Interface,
        ObjectType::Oa,
        ObjectType::Osc,
        ObjectType::Aps,
        ObjectType::ApsPort,
        ObjectType::Attenuator,
        ObjectType::Ocm,
        ObjectType::Otdr,
    ];

    /// Short upper-case name, e.g. `PORT`.
    pub const fn short_name(&self) -> &'static str {
        match self {
            ObjectType::Null => "NULL",
            ObjectType::Linecard => "LINECARD",
            ObjectType::Port => "PORT",
            ObjectType::Transceiver => "TRANSCEIVER",
            ObjectType::LogicalChannel => "LOGICALCHANNEL",
            ObjectType::Otn => "OTN",
            ObjectType::Ethernet => "ETHERNET",
            ObjectType::PhysicalChannel => "PHYSICALCHANNEL",
            ObjectType::Och => "OCH",
            ObjectType::Lldp => "LLDP",
            ObjectType::Assignment => "ASSIGNMENT",
            ObjectType::Interface => "INTERFACE",
            ObjectType::Oa => "OA",
            ObjectType::Osc => "OSC",
            ObjectType::Aps => "APS",
            ObjectType::ApsPort => "APSPORT",
            ObjectType::Attenuator => "ATTENUATOR",
            ObjectType::Ocm => "OCM",
            ObjectType::Otdr => "OTDR",
        }
    }

    pub fn from_raw(raw: u16) -> Option<Self> {
        if raw == 0 {
            return Some(ObjectType::Null);
        }
        Self::ALL.iter().copied().find(|t| *t as u16 == raw)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OTAI_OBJECT_TYPE_{}", self.short_name())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix("OTAI_OBJECT_TYPE_").unwrap_or(s);
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.short_name().eq_ignore_ascii_case(short))
            .ok_or_else(|| format!("unknown object type: {}", s))
    }
}

/// An OTAI object id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OtaiObjectId(RawOtaiObjectId);

impl OtaiObjectId {
    /// The null object ID (OTAI_NULL_OBJECT_ID).
    pub const NULL: Self = Self(0);

    /// Creates a new object ID from a raw value.
    ///
    /// Returns `None` if the raw value is 0 (null object ID).
    pub fn from_raw(raw: RawOtaiObjectId) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Creates a new object ID from a raw value, including null.
    pub const fn from_raw_unchecked(raw: RawOtaiObjectId) -> Self {
        Self(raw)
    }

    /// Builds an id with the object type encoded in the high bits.
    pub const fn compose(object_type: ObjectType, index: u64) -> Self {
        Self(((object_type as u64) << OBJECT_TYPE_SHIFT) | (index & OBJECT_INDEX_MASK))
    }

    pub const fn as_raw(&self) -> RawOtaiObjectId {
        self.0
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Object type encoded in the id, if it is one we know.
    pub fn object_type(&self) -> Option<ObjectType> {
        ObjectType::from_raw((self.0 >> OBJECT_TYPE_SHIFT) as u16)
    }

    /// Serialized form used as a key in counters and name-map tables.
    pub fn serialize(&self) -> String {
        format!("oid:0x{:x}", self.0)
    }

    /// Parses the serialized `oid:0x...` form.
    pub fn deserialize(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("oid:0x")?;
        u64::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl fmt::Debug for OtaiObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object_type() {
            Some(t) => write!(f, "{}(0x{:016x})", t.short_name(), self.0),
            None => write!(f, "Oid(0x{:016x})", self.0),
        }
    }
}

impl fmt::Display for OtaiObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
