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

//! Recursive conversion of raw values into field values

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::NumericMode;
use crate::core::{Result, UserDataError};
use crate::model::{DocumentReference, FieldValue, ObjectValue, Probe, RawValue, Timestamp};

use super::UserDataReader;
use super::context::{DataSource, ParseContext};
use super::mask_builder::ParseAccumulator;

impl UserDataReader {
    /// Run the pre-conversion hook on a non-container node
    pub(crate) fn pre_convert<'a>(&self, input: &'a RawValue) -> Cow<'a, RawValue> {
        match &self.pre_converter {
            Some(hook) if !input.is_container() => Cow::Owned(hook.convert(input.clone())),
            _ => Cow::Borrowed(input),
        }
    }

    /// Parse one node
    ///
    /// Returns `None` when the node was a sentinel, which is recorded as a
    /// transform and leaves no value behind.
    pub(crate) fn parse_data(
        &self,
        input: &RawValue,
        ctx: &ParseContext,
        acc: &mut ParseAccumulator,
    ) -> Result<Option<FieldValue>> {
        ctx.check_depth()?;
        let converted = self.pre_convert(input);
        self.parse_converted(&converted, ctx, acc)
    }

    /// Parse a node the hook has already seen
    pub(crate) fn parse_converted(
        &self,
        input: &RawValue,
        ctx: &ParseContext,
        acc: &mut ParseAccumulator,
    ) -> Result<Option<FieldValue>> {
        match input.classify() {
            Probe::Map(map) => self.parse_map(map, ctx, acc).map(|obj| Some(FieldValue::Map(obj))),
            Probe::Array(items) => self.parse_array(items, ctx, acc).map(Some),
            Probe::Sentinel(sentinel) => {
                self.parse_sentinel(sentinel, ctx, acc)?;
                Ok(None)
            }
            Probe::Scalar(scalar) => {
                let value = self.parse_scalar(scalar, ctx)?;
                if let Some(path) = ctx.mask_path() {
                    acc.record_touched(path.clone());
                }
                Ok(Some(value))
            }
            Probe::Opaque(host) => Err(UserDataError::UnsupportedType {
                type_name: host.type_name().to_string(),
                path: ctx.error_path(),
            }),
        }
    }

    pub(crate) fn parse_map(
        &self,
        map: &IndexMap<String, RawValue>,
        ctx: &ParseContext,
        acc: &mut ParseAccumulator,
    ) -> Result<ObjectValue> {
        if map.is_empty() {
            // An empty map is a leaf of its own.
            if let Some(path) = ctx.mask_path() {
                acc.record_touched(path.clone());
            }
            return Ok(ObjectValue::new());
        }

        let mut fields = BTreeMap::new();
        for (key, value) in map {
            let child = ctx.child_field(key)?;
            if let Some(parsed) = self.parse_data(value, &child, acc)? {
                fields.insert(key.clone(), parsed);
            }
        }
        Ok(ObjectValue::from_fields(fields))
    }

    fn parse_array(
        &self,
        items: &[RawValue],
        ctx: &ParseContext,
        acc: &mut ParseAccumulator,
    ) -> Result<FieldValue> {
        if ctx.is_array_element() && ctx.data_source() != DataSource::ArrayArgument {
            return Err(UserDataError::NestedArray {
                path: ctx.error_path(),
            });
        }

        let element = ctx.child_element();
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if let Some(parsed) = self.parse_data(item, &element, acc)? {
                values.push(parsed);
            }
        }

        // The array replaces the field as a whole.
        if let Some(path) = ctx.mask_path() {
            acc.record_touched(path.clone());
        }
        Ok(FieldValue::Array(values))
    }

    fn parse_scalar(&self, value: &RawValue, ctx: &ParseContext) -> Result<FieldValue> {
        let parsed = match value {
            RawValue::Null => FieldValue::Null,
            RawValue::Bool(b) => FieldValue::Boolean(*b),
            RawValue::Integer(i) => FieldValue::Integer(*i),
            RawValue::Unsigned(u) => self.parse_unsigned(*u, ctx)?,
            RawValue::Float(f) => FieldValue::Double(*f),
            RawValue::Decimal(d) => self.parse_decimal(d, ctx)?,
            RawValue::String(s) => FieldValue::String(s.clone()),
            RawValue::Bytes(bytes) => FieldValue::Bytes(bytes.clone()),
            RawValue::Timestamp(ts) => FieldValue::Timestamp(self.normalize_timestamp(*ts)),
            RawValue::DateTime(dt) => {
                let ts = Timestamp::from_datetime(*dt).map_err(|e| e.at(ctx.error_path()))?;
                FieldValue::Timestamp(self.normalize_timestamp(ts))
            }
            RawValue::GeoPoint(point) => FieldValue::GeoPoint(*point),
            RawValue::Reference(reference) => self.parse_reference(reference, ctx)?,
            other => {
                return Err(UserDataError::UnsupportedType {
                    type_name: other.type_name().to_string(),
                    path: ctx.error_path(),
                });
            }
        };
        Ok(parsed)
    }

    fn parse_unsigned(&self, value: u64, ctx: &ParseContext) -> Result<FieldValue> {
        if let Ok(signed) = i64::try_from(value) {
            return Ok(FieldValue::Integer(signed));
        }
        match self.config.numeric_mode {
            NumericMode::Strict => Err(UserDataError::NumericRange {
                value: value.to_string(),
                path: ctx.error_path(),
            }),
            NumericMode::Lenient => {
                log::debug!("Unsigned value {value} exceeds the integer range, storing as double");
                Ok(FieldValue::Double(value as f64))
            }
        }
    }

    fn parse_decimal(&self, value: &Decimal, ctx: &ParseContext) -> Result<FieldValue> {
        if value.fract().is_zero() {
            if let Some(integer) = value.to_i64() {
                return Ok(FieldValue::Integer(integer));
            }
        }

        let double = value.to_f64();
        let exact = double
            .and_then(|d| Decimal::from_str(&d.to_string()).ok())
            .is_some_and(|back| back == *value);
        match (double, self.config.numeric_mode) {
            (Some(d), NumericMode::Lenient) => Ok(FieldValue::Double(d)),
            (Some(d), NumericMode::Strict) if exact => Ok(FieldValue::Double(d)),
            _ => Err(UserDataError::NumericRange {
                value: value.to_string(),
                path: ctx.error_path(),
            }),
        }
    }

    fn normalize_timestamp(&self, ts: Timestamp) -> Timestamp {
        if self.config.truncate_timestamps {
            ts.truncated_to_micros()
        } else {
            ts
        }
    }

    fn parse_reference(
        &self,
        reference: &DocumentReference,
        ctx: &ParseContext,
    ) -> Result<FieldValue> {
        if reference.database_id != self.database_id {
            return Err(UserDataError::CrossDatabaseReference {
                found: reference.database_id.clone(),
                expected: self.database_id.clone(),
                path: ctx.error_path(),
            });
        }
        Ok(FieldValue::Reference(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserDataReaderBuilder;
    use crate::model::{DatabaseId, DocumentKey};
    use rstest::rstest;

    fn reader(strict: bool) -> UserDataReader {
        UserDataReaderBuilder::new(DatabaseId::default_for("project"))
            .with_strict_numbers(strict)
            .build()
    }

    fn parse(reader: &UserDataReader, value: RawValue) -> Result<Option<FieldValue>> {
        let ctx = ParseContext::root(DataSource::Argument, reader.config().max_depth);
        let mut acc = ParseAccumulator::new(DataSource::Argument);
        reader.parse_data(&value, &ctx, &mut acc)
    }

    #[rstest]
    #[case(RawValue::Null, FieldValue::Null)]
    #[case(RawValue::Bool(true), FieldValue::Boolean(true))]
    #[case(RawValue::Integer(-7), FieldValue::Integer(-7))]
    #[case(RawValue::Unsigned(42), FieldValue::Integer(42))]
    #[case(RawValue::Float(1.5), FieldValue::Double(1.5))]
    #[case(RawValue::from("text"), FieldValue::String("text".into()))]
    #[case(RawValue::Decimal(Decimal::new(300, 2)), FieldValue::Integer(3))]
    #[case(RawValue::Decimal(Decimal::new(25, 1)), FieldValue::Double(2.5))]
    fn test_scalars(#[case] input: RawValue, #[case] expected: FieldValue) {
        assert_eq!(parse(&reader(false), input).unwrap(), Some(expected));
    }

    #[test]
    fn test_large_unsigned() {
        let big = RawValue::Unsigned(u64::MAX);
        assert_eq!(
            parse(&reader(false), big.clone()).unwrap(),
            Some(FieldValue::Double(u64::MAX as f64))
        );
        assert!(matches!(
            parse(&reader(true), big),
            Err(UserDataError::NumericRange { .. })
        ));
    }

    #[test]
    fn test_inexact_decimal() {
        let precise = RawValue::Decimal(Decimal::from_str("0.1234567890123456789").unwrap());
        assert!(matches!(
            parse(&reader(false), precise.clone()),
            Ok(Some(FieldValue::Double(_)))
        ));
        assert!(matches!(
            parse(&reader(true), precise),
            Err(UserDataError::NumericRange { .. })
        ));

        let exact = RawValue::Decimal(Decimal::from_str("0.25").unwrap());
        assert_eq!(parse(&reader(true), exact).unwrap(), Some(FieldValue::Double(0.25)));
    }

    #[test]
    fn test_timestamp_truncation() {
        let ts = Timestamp::new(10, 123_456_789).unwrap();
        let parsed = parse(&reader(false), RawValue::Timestamp(ts)).unwrap();
        assert_eq!(
            parsed,
            Some(FieldValue::Timestamp(Timestamp::new(10, 123_456_000).unwrap()))
        );

        let keep = UserDataReaderBuilder::new(DatabaseId::default_for("project"))
            .with_timestamp_truncation(false)
            .build();
        assert_eq!(
            parse(&keep, RawValue::Timestamp(ts)).unwrap(),
            Some(FieldValue::Timestamp(ts))
        );
    }

    #[test]
    fn test_cross_database_reference() {
        let key = DocumentKey::from_path_string("rooms/eros").unwrap();
        let local = DocumentReference::new(DatabaseId::default_for("project"), key.clone());
        let foreign = DocumentReference::new(DatabaseId::new("other", "(default)"), key);

        assert_eq!(
            parse(&reader(false), RawValue::Reference(local.clone())).unwrap(),
            Some(FieldValue::Reference(local))
        );
        assert!(matches!(
            parse(&reader(false), RawValue::Reference(foreign)),
            Err(UserDataError::CrossDatabaseReference { .. })
        ));
    }

    #[test]
    fn test_opaque_without_hook() {
        struct Widget;
        let err = parse(&reader(false), RawValue::opaque(Widget)).unwrap_err();
        assert!(matches!(err, UserDataError::UnsupportedType { .. }));
    }
}
