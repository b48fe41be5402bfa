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

//! Strictly-typed document values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field_path::FieldPath;
use super::raw::RawValue;
use super::types::{DocumentReference, GeoPoint, Timestamp};

/// A parsed document value
///
/// This is the model handed to the mutation pipeline and the query builder.
/// Sentinels never appear here: they are extracted into transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Null value
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Double precision float
    Double(f64),

    /// Timestamp, truncated to microseconds by default
    Timestamp(Timestamp),

    /// UTF-8 string
    String(String),

    /// Byte blob
    Bytes(Vec<u8>),

    /// Reference to a document of the same database
    Reference(DocumentReference),

    /// Geographic point
    GeoPoint(GeoPoint),

    /// Ordered sequence of values
    Array(Vec<FieldValue>),

    /// Nested map
    Map(ObjectValue),
}

impl FieldValue {
    /// Get the type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Reference(_) => "document reference",
            Self::GeoPoint(_) => "geo point",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Borrow the map if this is one
    pub fn as_map(&self) -> Option<&ObjectValue> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the elements if this is an array
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to convert to an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to convert to a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back into the caller-facing input model.
    ///
    /// Parsing the result again yields an equal value.
    pub fn into_raw(self) -> RawValue {
        match self {
            Self::Null => RawValue::Null,
            Self::Boolean(b) => RawValue::Bool(b),
            Self::Integer(i) => RawValue::Integer(i),
            Self::Double(d) => RawValue::Float(d),
            Self::Timestamp(ts) => RawValue::Timestamp(ts),
            Self::String(s) => RawValue::String(s),
            Self::Bytes(b) => RawValue::Bytes(b),
            Self::Reference(r) => RawValue::Reference(r),
            Self::GeoPoint(g) => RawValue::GeoPoint(g),
            Self::Array(items) => RawValue::Array(items.into_iter().map(Self::into_raw).collect()),
            Self::Map(map) => RawValue::Map(
                map.into_fields()
                    .into_iter()
                    .map(|(k, v)| (k, v.into_raw()))
                    .collect(),
            ),
        }
    }
}

impl From<ObjectValue> for FieldValue {
    fn from(map: ObjectValue) -> Self {
        FieldValue::Map(map)
    }
}

/// Map of field name to value. Key order is not significant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectValue {
    fields: BTreeMap<String, FieldValue>,
}

impl ObjectValue {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from already-parsed fields
    pub fn from_fields(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// Borrow the top-level fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Take ownership of the top-level fields
    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Insert a top-level field
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    /// Look up the value at `path`
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get(first)?;
        for segment in rest {
            current = current.as_map()?.fields.get(segment)?;
        }
        Some(current)
    }

    /// Write `value` at `path`, creating or replacing intermediate maps
    pub fn set(&mut self, path: &FieldPath, value: FieldValue) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };
        let mut current = self;
        for segment in parents {
            let entry = current
                .fields
                .entry(segment.clone())
                .or_insert_with(|| FieldValue::Map(ObjectValue::new()));
            if !matches!(entry, FieldValue::Map(_)) {
                *entry = FieldValue::Map(ObjectValue::new());
            }
            let FieldValue::Map(next) = entry else {
                return;
            };
            current = next;
        }
        current.fields.insert(last.clone(), value);
    }

    /// Remove the value at `path`, returning it
    pub fn delete(&mut self, path: &FieldPath) -> Option<FieldValue> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = self;
        for segment in parents {
            match current.fields.get_mut(segment)? {
                FieldValue::Map(next) => current = next,
                _ => return None,
            }
        }
        current.fields.remove(last)
    }

    /// Paths of every leaf. Empty maps count as leaves.
    pub fn leaf_paths(&self) -> Vec<FieldPath> {
        let mut paths = Vec::new();
        self.collect_leaf_paths(&FieldPath::empty(), &mut paths);
        paths
    }

    fn collect_leaf_paths(&self, prefix: &FieldPath, paths: &mut Vec<FieldPath>) {
        for (name, value) in &self.fields {
            let path = prefix.child(name.clone());
            match value {
                FieldValue::Map(map) if !map.is_empty() => map.collect_leaf_paths(&path, paths),
                _ => paths.push(path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(s: &str) -> FieldPath {
        FieldPath::from_dot_separated(s).unwrap()
    }

    #[test]
    fn test_set_creates_intermediate_maps() {
        let mut object = ObjectValue::new();
        object.set(&path("a.b.c"), FieldValue::Integer(1));

        assert_eq!(object.get(&path("a.b.c")), Some(&FieldValue::Integer(1)));
        assert!(object.get(&path("a.b")).and_then(FieldValue::as_map).is_some());
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let mut object = ObjectValue::new();
        object.insert("a", FieldValue::String("x".into()));
        object.set(&path("a.b"), FieldValue::Boolean(true));

        assert_eq!(object.get(&path("a.b")), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_delete() {
        let mut object = ObjectValue::new();
        object.set(&path("a.b"), FieldValue::Integer(1));
        object.set(&path("a.c"), FieldValue::Integer(2));

        assert_eq!(object.delete(&path("a.b")), Some(FieldValue::Integer(1)));
        assert_eq!(object.delete(&path("a.b")), None);
        assert_eq!(object.delete(&path("a.c.d")), None);
        assert_eq!(object.leaf_paths(), vec![path("a.c")]);
    }

    #[test]
    fn test_leaf_paths() {
        let mut object = ObjectValue::new();
        object.set(&path("a.b"), FieldValue::Integer(1));
        object.insert("empty", FieldValue::Map(ObjectValue::new()));
        object.insert("list", FieldValue::Array(vec![FieldValue::Null]));

        assert_eq!(
            object.leaf_paths(),
            vec![path("a.b"), path("empty"), path("list")]
        );
    }

    #[test]
    fn test_into_raw() {
        let mut object = ObjectValue::new();
        object.set(&path("a.b"), FieldValue::Double(1.5));

        let raw = FieldValue::Map(object).into_raw();
        assert_eq!(
            raw,
            RawValue::map([("a", RawValue::map([("b", RawValue::Float(1.5))]))])
        );
    }
}
