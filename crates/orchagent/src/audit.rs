//! Structured and audit logging.
//!
//! Every orchestrator logs through the `*_log!` wrappers so that events carry
//! a `source` field naming the orch (e.g. `PortOrch`). Events that change the
//! hardware or the daemon lifecycle additionally emit an [`AuditRecord`] on
//! the `audit` target:
//!
//! - object create/remove and imperative sets
//! - readiness FSM transitions and daemon start/stop
//! - counter group reconfiguration
//! - HAL failures that affect the running configuration
//!
//! | Macro | Level | Usage |
//! |-------|-------|-------|
//! | `error_log!` | error | Operation failures |
//! | `warn_log!` | warn | Skipped fields, degraded states |
//! | `info_log!` | info | Creation, transitions |
//! | `debug_log!` | debug | Per-entry tracing |
//! | `audit_log!` | info/debug/warn by outcome | Audit trail |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Hardware object created
    ResourceCreate,
    /// Hardware object attributes changed
    ResourceModify,
    /// Hardware object removed
    ResourceDelete,
    /// Counter group or declarative configuration changes
    ConfigurationChange,
    /// Daemon start/stop and readiness transitions
    SystemLifecycle,
    /// HAL flush, pre-configuration and similar linecard-wide calls
    HalOperation,
    /// Error and failure events
    ErrorCondition,
    /// Imperative operations requested over a notification channel
    AdminAction,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceModify => write!(f, "RESOURCE_MODIFY"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::ConfigurationChange => write!(f, "CONFIGURATION_CHANGE"),
            AuditCategory::SystemLifecycle => write!(f, "SYSTEM_LIFECYCLE"),
            AuditCategory::HalOperation => write!(f, "HAL_OPERATION"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
            AuditCategory::AdminAction => write!(f, "ADMIN_ACTION"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    InProgress,
    /// Rejected before reaching the HAL (wrong FSM state, wrong attribute class)
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
            AuditOutcome::InProgress => write!(f, "in_progress"),
            AuditOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// One audit trail entry.
///
/// Built with the `with_*` methods and handed to `audit_log!`. The outcome
/// starts as [`AuditOutcome::InProgress`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,

    pub category: AuditCategory,

    /// Orch or component that generated the event
    pub source: String,

    pub action: String,

    pub outcome: AuditOutcome,

    /// Serialized OTAI object id or declarative key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// e.g. "TRANSCEIVER", "linecard", "counter_group"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The `operation-id` of the request, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AuditRecord {
    pub fn new(category: AuditCategory, source: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
            correlation_id: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the error message and marks the outcome as Failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Debug-level event tagged with its source.
///
/// ```ignore
/// debug_log!("PortOrch", key = %key, "doTask");
/// ```
#[macro_export]
macro_rules! debug_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::debug!(
            source = $source,
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! info_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::info!(
            source = $source,
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! warn_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::warn!(
            source = $source,
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! error_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::error!(
            source = $source,
            $($arg)*
        )
    };
}

/// Emits an [`AuditRecord`] on the `audit` target.
///
/// Success is logged at info, InProgress at debug, Failure and Denied at warn.
///
/// ```ignore
/// let record = AuditRecord::new(AuditCategory::ResourceCreate, "PortOrch", "create_object")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id(oid.serialize())
///     .with_object_type("PORT");
/// audit_log!(record);
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure | $crate::audit::AuditOutcome::Denied => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

/// Installs a JSON subscriber; `RUST_LOG` overrides `log_level`.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .init();
}

/// Human-readable variant of [`init_logging`] for running on a console.
pub fn init_logging_pretty(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_record_creation() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "PortOrch", "create_object")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("oid:0x2000000000001")
            .with_object_type("PORT");

        assert_eq!(record.category, AuditCategory::ResourceCreate);
        assert_eq!(record.source, "PortOrch");
        assert_eq!(record.action, "create_object");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id, Some("oid:0x2000000000001".to_string()));
        assert_eq!(record.object_type, Some("PORT".to_string()));
    }

    #[test]
    fn test_audit_record_with_error() {
        let record = AuditRecord::new(AuditCategory::ErrorCondition, "LinecardOrch", "create_linecard")
            .with_error("OTAI operation failed: OTAI_STATUS_FAILURE");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error, Some("OTAI operation failed: OTAI_STATUS_FAILURE".to_string()));
    }

    #[test]
    fn test_audit_record_json_serialization() {
        let record = AuditRecord::new(AuditCategory::ConfigurationChange, "FlexCounterOrch", "set_poll_interval")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "group": "1S_STAT_GAUGE",
                "interval": 2000
            }));

        let json = record.to_json();
        assert!(json.contains("CONFIGURATION_CHANGE"));
        assert!(json.contains("FlexCounterOrch"));
        assert!(json.contains("set_poll_interval"));
        assert!(json.contains("\"group\":\"1S_STAT_GAUGE\""));
        assert!(!json.contains("correlation_id"));
    }

    #[test]
    fn test_audit_category_display() {
        assert_eq!(AuditCategory::HalOperation.to_string(), "HAL_OPERATION");
        assert_eq!(AuditCategory::ResourceCreate.to_string(), "RESOURCE_CREATE");
        assert_eq!(AuditCategory::AdminAction.to_string(), "ADMIN_ACTION");
    }

    #[test]
    fn test_audit_outcome_display() {
        assert_eq!(AuditOutcome::Success.to_string(), "success");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
        assert_eq!(AuditOutcome::Denied.to_string(), "denied");
    }

    #[test]
    fn test_audit_record_with_correlation_id() {
        let record = AuditRecord::new(AuditCategory::ResourceModify, "OchOrch", "set_attrs")
            .with_correlation_id("42")
            .with_outcome(AuditOutcome::InProgress);

        assert_eq!(record.correlation_id, Some("42".to_string()));
    }
}
