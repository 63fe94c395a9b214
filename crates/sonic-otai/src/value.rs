//! Typed attribute values and their string form.
//!
//! Declarative rows carry every value as a string. The orchestrators turn
//! them into [`AttrValue`]s with [`deserialize_attr_value`] and back with
//! [`serialize_attr_value`] when replying to imperative `get` requests or
//! caching values in the state store.

use std::fmt;
use std::sync::Arc;

use crate::error::{OtaiError, OtaiResult};
use crate::metadata::{AttrId, AttrMetadata, AttrValueType};
use crate::types::OtaiObjectId;

/// Operational status reported by the linecard state-change callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperStatus {
    Unknown,
    Active,
    Inactive,
}

impl OperStatus {
    pub fn from_value(value: i32) -> Self {
        match value {
            1 => OperStatus::Active,
            2 => OperStatus::Inactive,
            _ => OperStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperStatus::Unknown => "UNKNOWN",
            OperStatus::Active => "ACTIVE",
            OperStatus::Inactive => "INACTIVE",
        }
    }
}

pub type LinecardStateChangeFn = Arc<dyn Fn(OtaiObjectId, OperStatus) + Send + Sync>;
pub type LinecardAlarmFn = Arc<dyn Fn(OtaiObjectId, &str) + Send + Sync>;
pub type ApsSwitchInfoFn = Arc<dyn Fn(OtaiObjectId, &str) + Send + Sync>;

/// Callback registered through a pointer attribute.
///
/// The HAL may invoke these from any thread.
#[derive(Clone)]
pub enum NotificationHandler {
    LinecardStateChange(LinecardStateChangeFn),
    LinecardAlarm(LinecardAlarmFn),
    ApsSwitchInfo(ApsSwitchInfoFn),
}

impl NotificationHandler {
    fn kind(&self) -> &'static str {
        match self {
            NotificationHandler::LinecardStateChange(_) => "linecard_state_change",
            NotificationHandler::LinecardAlarm(_) => "linecard_alarm",
            NotificationHandler::ApsSwitchInfo(_) => "aps_switch_info",
        }
    }
}

impl fmt::Debug for NotificationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotificationHandler({})", self.kind())
    }
}

impl PartialEq for NotificationHandler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::LinecardStateChange(a), Self::LinecardStateChange(b)) => Arc::ptr_eq(a, b),
            (Self::LinecardAlarm(a), Self::LinecardAlarm(b)) => Arc::ptr_eq(a, b),
            (Self::ApsSwitchInfo(a), Self::ApsSwitchInfo(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    Double(f64),
    Chardata(String),
    Enum(i32),
    ObjectId(OtaiObjectId),
    Notification(NotificationHandler),
}

impl AttrValue {
    pub fn as_enum(&self) -> Option<i32> {
        match self {
            AttrValue::Enum(v) | AttrValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Zero value of a given type; pointers have none.
    pub fn zero(value_type: AttrValueType) -> Option<Self> {
        Some(match value_type {
            AttrValueType::Bool => AttrValue::Bool(false),
            AttrValueType::U8 => AttrValue::U8(0),
            AttrValueType::U16 => AttrValue::U16(0),
            AttrValueType::U32 => AttrValue::U32(0),
            AttrValueType::U64 => AttrValue::U64(0),
            AttrValueType::I32 => AttrValue::I32(0),
            AttrValueType::Double => AttrValue::Double(0.0),
            AttrValueType::Chardata => AttrValue::Chardata(String::new()),
            AttrValueType::Enum(e) => AttrValue::Enum(e.values.first().map(|(v, _)| *v).unwrap_or(0)),
            AttrValueType::ObjectId => AttrValue::ObjectId(OtaiObjectId::NULL),
            AttrValueType::Pointer => return None,
        })
    }
}

/// One attribute: id plus value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: AttrId,
    pub value: AttrValue,
}

impl Attribute {
    pub fn new(id: AttrId, value: AttrValue) -> Self {
        Self { id, value }
    }
}

fn parse_num<T: std::str::FromStr>(value: &str, meta: &AttrMetadata) -> OtaiResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| OtaiError::invalid_parameter(format!("{}: cannot parse '{}'", meta.name, value)))
}

/// Translates a declarative string into a typed value.
pub fn deserialize_attr_value(value: &str, meta: &AttrMetadata) -> OtaiResult<AttrValue> {
    Ok(match meta.value_type {
        AttrValueType::Bool => match value {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            _ => {
                return Err(OtaiError::invalid_parameter(format!(
                    "{}: expected true or false, got '{}'",
                    meta.name, value
                )))
            }
        },
        AttrValueType::U8 => AttrValue::U8(parse_num(value, meta)?),
        AttrValueType::U16 => AttrValue::U16(parse_num(value, meta)?),
        AttrValueType::U32 => AttrValue::U32(parse_num(value, meta)?),
        AttrValueType::U64 => AttrValue::U64(parse_num(value, meta)?),
        AttrValueType::I32 => AttrValue::I32(parse_num(value, meta)?),
        AttrValueType::Double => AttrValue::Double(parse_num(value, meta)?),
        AttrValueType::Chardata => AttrValue::Chardata(value.to_string()),
        AttrValueType::Enum(e) => AttrValue::Enum(e.value_of(value).ok_or_else(|| {
            OtaiError::invalid_parameter(format!("{}: '{}' is not a member of {}", meta.name, value, e.name))
        })?),
        AttrValueType::ObjectId => AttrValue::ObjectId(
            OtaiObjectId::deserialize(value)
                .ok_or_else(|| OtaiError::invalid_parameter(format!("{}: bad object id '{}'", meta.name, value)))?,
        ),
        AttrValueType::Pointer => {
            return Err(OtaiError::invalid_parameter(format!(
                "{}: pointer attributes cannot be set from a string",
                meta.name
            )))
        }
    })
}

/// Renders a typed value the way declarative rows and replies carry it.
pub fn serialize_attr_value(meta: &AttrMetadata, value: &AttrValue) -> String {
    match value {
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::U8(v) => v.to_string(),
        AttrValue::U16(v) => v.to_string(),
        AttrValue::U32(v) => v.to_string(),
        AttrValue::U64(v) => v.to_string(),
        AttrValue::I32(v) => v.to_string(),
        AttrValue::Double(v) => format!("{:.2}", v),
        AttrValue::Chardata(s) => s.clone(),
        AttrValue::Enum(v) => match meta.value_type {
            AttrValueType::Enum(e) => e.name_of(*v).map(str::to_string).unwrap_or_else(|| v.to_string()),
            _ => v.to_string(),
        },
        AttrValue::ObjectId(oid) => oid.serialize(),
        AttrValue::Notification(handler) => format!("{:?}", handler),
    }
}
