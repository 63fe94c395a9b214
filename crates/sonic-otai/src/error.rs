//! OTAI error types and status handling.
//!
//! HAL calls return raw status codes; this module turns them into Rust's
//! Result type while keeping the numeric code around, because operation
//! results are published to clients as the decimal status.

use std::fmt;
use thiserror::Error;

/// OTAI status codes matching the C API.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtaiStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InsufficientResources = -4,
    InvalidParameter = -5,
    ItemAlreadyExists = -6,
    ItemNotFound = -7,
    Uninitialized = -12,
    MandatoryAttributeMissing = -14,
    NotImplemented = -15,
    ObjectInUse = -17,
    InvalidObjectType = -18,
    InvalidObjectId = -19,
    NotExecuted = -23,
    InvalidAttribute = -24,
}

impl OtaiStatus {
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => OtaiStatus::Success,
            -2 => OtaiStatus::NotSupported,
            -3 => OtaiStatus::NoMemory,
            -4 => OtaiStatus::InsufficientResources,
            -5 => OtaiStatus::InvalidParameter,
            -6 => OtaiStatus::ItemAlreadyExists,
            -7 => OtaiStatus::ItemNotFound,
            -12 => OtaiStatus::Uninitialized,
            -14 => OtaiStatus::MandatoryAttributeMissing,
            -15 => OtaiStatus::NotImplemented,
            -17 => OtaiStatus::ObjectInUse,
            -18 => OtaiStatus::InvalidObjectType,
            -19 => OtaiStatus::InvalidObjectId,
            -23 => OtaiStatus::NotExecuted,
            -24 => OtaiStatus::InvalidAttribute,
            _ => OtaiStatus::Failure,
        }
    }

    /// Numeric code as carried in operation-result notifications.
    pub const fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        *self == OtaiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> OtaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(OtaiError::from_status(self))
        }
    }
}

impl fmt::Display for OtaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OtaiStatus::Success => "OTAI_STATUS_SUCCESS",
            OtaiStatus::Failure => "OTAI_STATUS_FAILURE",
            OtaiStatus::NotSupported => "OTAI_STATUS_NOT_SUPPORTED",
            OtaiStatus::NoMemory => "OTAI_STATUS_NO_MEMORY",
            OtaiStatus::InsufficientResources => "OTAI_STATUS_INSUFFICIENT_RESOURCES",
            OtaiStatus::InvalidParameter => "OTAI_STATUS_INVALID_PARAMETER",
            OtaiStatus::ItemAlreadyExists => "OTAI_STATUS_ITEM_ALREADY_EXISTS",
            OtaiStatus::ItemNotFound => "OTAI_STATUS_ITEM_NOT_FOUND",
            OtaiStatus::Uninitialized => "OTAI_STATUS_UNINITIALIZED",
            OtaiStatus::MandatoryAttributeMissing => "OTAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            OtaiStatus::NotImplemented => "OTAI_STATUS_NOT_IMPLEMENTED",
            OtaiStatus::ObjectInUse => "OTAI_STATUS_OBJECT_IN_USE",
            OtaiStatus::InvalidObjectType => "OTAI_STATUS_INVALID_OBJECT_TYPE",
            OtaiStatus::InvalidObjectId => "OTAI_STATUS_INVALID_OBJECT_ID",
            OtaiStatus::NotExecuted => "OTAI_STATUS_NOT_EXECUTED",
            OtaiStatus::InvalidAttribute => "OTAI_STATUS_INVALID_ATTRIBUTE",
        };
        write!(f, "{}", s)
    }
}

/// Error type for OTAI operations.
#[derive(Debug, Clone, Error)]
pub enum OtaiError {
    /// HAL returned an error status.
    #[error("OTAI operation failed: {status}")]
    Status { status: OtaiStatus },

    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    /// A declarative value could not be translated to a typed attribute.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Item not found: {item}")]
    NotFound { item: String },

    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    #[error("OTAI not initialized")]
    Uninitialized,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OtaiError {
    pub fn from_status(status: OtaiStatus) -> Self {
        match status {
            OtaiStatus::Success => OtaiError::Internal {
                message: "from_status called with success status".to_string(),
            },
            OtaiStatus::ItemNotFound => OtaiError::NotFound {
                item: "unknown".to_string(),
            },
            OtaiStatus::ItemAlreadyExists => OtaiError::AlreadyExists {
                item: "unknown".to_string(),
            },
            OtaiStatus::Uninitialized => OtaiError::Uninitialized,
            _ => OtaiError::Status { status },
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        OtaiError::NotSupported {
            feature: feature.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        OtaiError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn not_found(item: impl Into<String>) -> Self {
        OtaiError::NotFound { item: item.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        OtaiError::Internal {
            message: message.into(),
        }
    }

    /// Status code equivalent of this error.
    pub fn status(&self) -> OtaiStatus {
        match self {
            OtaiError::Status { status } => *status,
            OtaiError::NotSupported { .. } => OtaiStatus::NotSupported,
            OtaiError::InvalidParameter { .. } => OtaiStatus::InvalidParameter,
            OtaiError::NotFound { .. } => OtaiStatus::ItemNotFound,
            OtaiError::AlreadyExists { .. } => OtaiStatus::ItemAlreadyExists,
            OtaiError::Uninitialized => OtaiStatus::Uninitialized,
            OtaiError::Internal { .. } => OtaiStatus::Failure,
        }
    }
}

/// Result type for OTAI operations.
pub type OtaiResult<T> = Result<T, OtaiError>;
