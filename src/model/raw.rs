// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loosely-typed caller input
//!
//! [`RawValue`] is the closed set of shapes a caller can hand to the reader:
//! mappings, sequences, identified scalar kinds, sentinels, and opaque host
//! objects. Opaque values are only meaningful to the reader's pre-conversion
//! hook, which may turn them into any of the other shapes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::sentinel::Sentinel;
use super::types::{DocumentReference, GeoPoint, Timestamp};

/// A host object the converter cannot interpret on its own
#[derive(Clone)]
pub struct HostValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostValue {
    /// Wrap a host object
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Rust type name of the wrapped object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped object if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostValue({})", self.type_name)
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Caller-supplied document data
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// Unsigned integers above `i64::MAX` need best-effort conversion
    Unsigned(u64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
    DateTime(DateTime<Utc>),
    GeoPoint(GeoPoint),
    Reference(DocumentReference),
    Array(Vec<RawValue>),
    Map(IndexMap<String, RawValue>),
    Sentinel(Sentinel),
    Opaque(HostValue),
}

/// Result of classifying a raw node
#[derive(Debug, Clone, Copy)]
pub enum Probe<'a> {
    Map(&'a IndexMap<String, RawValue>),
    Array(&'a [RawValue]),
    Sentinel(&'a Sentinel),
    Scalar(&'a RawValue),
    Opaque(&'a HostValue),
}

impl RawValue {
    /// Build a map from key/value pairs, keeping their order
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        RawValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        RawValue::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a byte blob
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RawValue::Bytes(bytes.into())
    }

    /// Wrap a host object for the pre-conversion hook
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        RawValue::Opaque(HostValue::new(value))
    }

    /// Classify the node into one of the shapes the reader handles
    pub fn classify(&self) -> Probe<'_> {
        match self {
            RawValue::Map(map) => Probe::Map(map),
            RawValue::Array(items) => Probe::Array(items),
            RawValue::Sentinel(sentinel) => Probe::Sentinel(sentinel),
            RawValue::Opaque(host) => Probe::Opaque(host),
            scalar => Probe::Scalar(scalar),
        }
    }

    /// Maps and arrays
    pub fn is_container(&self) -> bool {
        matches!(self, RawValue::Map(_) | RawValue::Array(_))
    }

    /// Human-readable kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Integer(_) | RawValue::Unsigned(_) => "integer",
            RawValue::Float(_) => "double",
            RawValue::Decimal(_) => "decimal",
            RawValue::String(_) => "string",
            RawValue::Bytes(_) => "bytes",
            RawValue::Timestamp(_) | RawValue::DateTime(_) => "timestamp",
            RawValue::GeoPoint(_) => "geo point",
            RawValue::Reference(_) => "document reference",
            RawValue::Array(_) => "array",
            RawValue::Map(_) => "map",
            RawValue::Sentinel(_) => "sentinel",
            RawValue::Opaque(host) => host.type_name(),
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Integer(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        RawValue::Integer(v as i64)
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        RawValue::Unsigned(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Float(v as f64)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<Decimal> for RawValue {
    fn from(v: Decimal) -> Self {
        RawValue::Decimal(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::String(v)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}

impl From<Timestamp> for RawValue {
    fn from(v: Timestamp) -> Self {
        RawValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(v: DateTime<Utc>) -> Self {
        RawValue::DateTime(v)
    }
}

impl From<GeoPoint> for RawValue {
    fn from(v: GeoPoint) -> Self {
        RawValue::GeoPoint(v)
    }
}

impl From<DocumentReference> for RawValue {
    fn from(v: DocumentReference) -> Self {
        RawValue::Reference(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        RawValue::Array(v)
    }
}

impl From<IndexMap<String, RawValue>> for RawValue {
    fn from(v: IndexMap<String, RawValue>) -> Self {
        RawValue::Map(v)
    }
}

impl From<Sentinel> for RawValue {
    fn from(v: Sentinel) -> Self {
        RawValue::Sentinel(v)
    }
}

impl From<HostValue> for RawValue {
    fn from(v: HostValue) -> Self {
        RawValue::Opaque(v)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::Unsigned(u)
                } else {
                    RawValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::Array(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => RawValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let raw = RawValue::from(json!({
            "name": "Ada",
            "age": 36,
            "big": u64::MAX,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "nothing": null
        }));

        let RawValue::Map(map) = raw else {
            panic!("expected a map");
        };
        assert_eq!(map["name"], RawValue::String("Ada".into()));
        assert_eq!(map["age"], RawValue::Integer(36));
        assert_eq!(map["big"], RawValue::Unsigned(u64::MAX));
        assert_eq!(map["ratio"], RawValue::Float(0.5));
        assert_eq!(map["tags"], RawValue::array(["a", "b"]));
        assert_eq!(map["nothing"], RawValue::Null);
    }

    #[test]
    fn test_classify() {
        assert!(matches!(RawValue::map([("a", 1i64)]).classify(), Probe::Map(_)));
        assert!(matches!(RawValue::array([1i64]).classify(), Probe::Array(_)));
        assert!(matches!(
            RawValue::from(Sentinel::delete()).classify(),
            Probe::Sentinel(Sentinel::Delete)
        ));
        assert!(matches!(RawValue::from("x").classify(), Probe::Scalar(_)));
        assert!(matches!(RawValue::opaque(3u8).classify(), Probe::Opaque(_)));
    }

    #[test]
    fn test_host_values() {
        struct Celsius(f64);

        let raw = RawValue::opaque(Celsius(21.5));
        let RawValue::Opaque(host) = &raw else {
            panic!("expected an opaque value");
        };
        assert!(host.type_name().ends_with("Celsius"));
        assert_eq!(host.downcast_ref::<Celsius>().map(|c| c.0), Some(21.5));
        assert!(host.downcast_ref::<String>().is_none());
        assert_eq!(raw.clone(), raw);
    }
}
