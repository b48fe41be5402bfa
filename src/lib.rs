//! User data conversion for a client-side document database
//!
//! Turns arbitrary caller values into the typed document model used by
//! writes and queries:
//!
//! - plain values become [`FieldValue`]s inside an [`ObjectValue`]
//! - sentinels such as server timestamps become [`FieldTransform`]s
//! - partial writes get a [`FieldMask`] of the paths they touch
//!
//! ```
//! use serde_json::json;
//! use user_data_reader::{DatabaseId, RawValue, UserDataReader};
//!
//! let reader = UserDataReader::builder(DatabaseId::default_for("my-project")).build();
//! let parsed = reader
//!     .parsed_merge_data(&RawValue::from(json!({"a": {"b": 1}})), None)
//!     .unwrap();
//! assert_eq!(parsed.field_mask().unwrap().len(), 1);
//! ```

pub mod config;
pub mod core;
pub mod model;
pub mod reader;

// Re-export main types
pub use config::{DEFAULT_MAX_DEPTH, NumericMode, ReaderConfig, UserDataReaderBuilder};
pub use crate::core::{ErrorCode, Result, UserDataError};
pub use model::{
    DatabaseId, DocumentKey, DocumentReference, FieldMask, FieldPath, FieldTransform, FieldValue,
    GeoPoint, HostValue, Number, ObjectValue, RawFieldPath, RawValue, Sentinel, SentinelKind,
    Timestamp, TransformOperation,
};
pub use reader::{DataSource, ParsedSetData, ParsedUpdateData, PreConverter, UserDataReader};
