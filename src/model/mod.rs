//! Data model for caller input and parsed writes
//!
//! [`RawValue`] is what callers hand in; [`FieldValue`], [`FieldTransform`]
//! and [`FieldMask`] are what the reader hands to the write pipeline.

pub mod field_mask;
pub mod field_path;
pub mod raw;
pub mod sentinel;
pub mod transform;
pub mod types;
pub mod value;

pub use field_mask::FieldMask;
pub use field_path::{FieldPath, RawFieldPath};
pub use raw::{HostValue, Probe, RawValue};
pub use sentinel::{Sentinel, SentinelKind};
pub use transform::{FieldTransform, TransformOperation};
pub use types::{
    DEFAULT_DATABASE_ID, DatabaseId, DocumentKey, DocumentReference, GeoPoint, Number, Timestamp,
};
pub use value::{FieldValue, ObjectValue};
