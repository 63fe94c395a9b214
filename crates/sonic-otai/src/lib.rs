//! Safe Rust model of the OTAI (Optical Transport Abstraction Interface).
//!
//! The line-card orchestration agent never talks to vendor code directly. It
//! goes through the [`OtaiApi`] trait, which exposes the four per-object
//! function slots (create/remove/set/get) plus an attribute metadata oracle.
//!
//! - [`types`]: object types and object ids
//! - [`error`]: status codes and error handling
//! - [`metadata`]: attribute descriptors per object type
//! - [`value`]: typed attribute values and their string (de)serializer
//! - [`api`]: the HAL trait and the per-object-type binding
//! - [`vs`]: an in-memory virtual HAL
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sonic_otai::{attrs::port, ObjectApi, ObjectType, OtaiApi, VirtualOtai};
//!
//! let hal: Arc<dyn OtaiApi> = Arc::new(VirtualOtai::new());
//! let ports = ObjectApi::new(ObjectType::Port, hal);
//! let meta = ports.metadata(port::ADMIN_STATE).unwrap();
//! assert_eq!(meta.kebab_name, "admin-state");
//! ```

pub mod api;
pub mod attrs;
pub mod error;
pub mod metadata;
pub mod types;
pub mod value;
pub mod vs;

pub use api::{ObjectApi, OtaiApi};
pub use error::{OtaiError, OtaiResult, OtaiStatus};
pub use metadata::{get_attr_metadata, object_attr_metadata, Access, AttrId, AttrMetadata, AttrValueType, EnumMetadata};
pub use types::{ObjectType, OtaiObjectId, RawOtaiObjectId};
pub use value::{
    deserialize_attr_value, serialize_attr_value, Attribute, AttrValue, NotificationHandler, OperStatus,
};
pub use vs::{HalCall, VirtualOtai};
