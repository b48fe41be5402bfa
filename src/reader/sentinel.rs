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

//! Sentinel interpretation
//!
//! Sentinels never produce a value. In writes they become a
//! [`TransformOperation`] at the current path; anywhere else they are an
//! error.

use crate::core::{Result, UserDataError};
use crate::model::{FieldValue, Number, RawValue, Sentinel, SentinelKind, TransformOperation};

use super::UserDataReader;
use super::context::{DataSource, ParseContext};
use super::mask_builder::ParseAccumulator;

impl UserDataReader {
    pub(crate) fn parse_sentinel(
        &self,
        sentinel: &Sentinel,
        ctx: &ParseContext,
        acc: &mut ParseAccumulator,
    ) -> Result<()> {
        let kind = sentinel.kind();
        if let Some(outer) = ctx.operand_of() {
            return Err(UserDataError::InvalidSentinelNesting {
                sentinel: kind,
                reason: format!("cannot be used inside the operand of {outer}"),
                path: ctx.error_path(),
            });
        }
        if !ctx.is_write() {
            return Err(UserDataError::InvalidSentinelInQuery {
                sentinel: kind,
                path: ctx.error_path(),
            });
        }
        if ctx.in_array() {
            return Err(UserDataError::InvalidSentinelNesting {
                sentinel: kind,
                reason: "is not currently supported inside arrays".to_string(),
                path: ctx.error_path(),
            });
        }

        let operation = match sentinel {
            Sentinel::Delete => match ctx.data_source() {
                DataSource::MergeSet => TransformOperation::Delete,
                DataSource::Update => {
                    return Err(UserDataError::InvalidDeleteNesting {
                        reason: "can only appear at the top level of your update data".to_string(),
                        path: ctx.error_path(),
                    });
                }
                _ => {
                    return Err(UserDataError::InvalidDeleteNesting {
                        reason: "can only be used with update() and set() with merge".to_string(),
                        path: ctx.error_path(),
                    });
                }
            },
            Sentinel::ServerTimestamp => TransformOperation::ServerTimestamp,
            Sentinel::ArrayUnion(elements) => {
                TransformOperation::ArrayUnion(self.parse_array_operand(elements, kind, ctx)?)
            }
            Sentinel::ArrayRemove(elements) => {
                TransformOperation::ArrayRemove(self.parse_array_operand(elements, kind, ctx)?)
            }
            Sentinel::Increment(operand) => {
                TransformOperation::Increment(self.parse_increment_operand(operand, ctx)?)
            }
        };

        acc.add_transform(ctx.path().clone(), operation)
    }

    fn parse_array_operand(
        &self,
        elements: &[RawValue],
        kind: SentinelKind,
        ctx: &ParseContext,
    ) -> Result<Vec<FieldValue>> {
        let operand = ctx.operand_context(kind);
        // Operands never contribute to the enclosing write's mask.
        let mut scratch = ParseAccumulator::new(DataSource::Argument);

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(parsed) = self.parse_data(element, &operand, &mut scratch)? {
                values.push(parsed);
            }
        }
        Ok(values)
    }

    fn parse_increment_operand(&self, operand: &RawValue, ctx: &ParseContext) -> Result<Number> {
        let operand_ctx = ctx.operand_context(SentinelKind::Increment);
        let mut scratch = ParseAccumulator::new(DataSource::Argument);

        match self.parse_data(operand, &operand_ctx, &mut scratch)? {
            Some(FieldValue::Integer(i)) => Ok(Number::Integer(i)),
            Some(FieldValue::Double(d)) => Ok(Number::Double(d)),
            other => Err(UserDataError::InvalidIncrementOperand {
                type_name: other
                    .as_ref()
                    .map_or("sentinel", FieldValue::type_name)
                    .to_string(),
                path: ctx.error_path(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatabaseId, FieldPath};
    use crate::reader::UserDataReader;

    fn reader() -> UserDataReader {
        UserDataReader::builder(DatabaseId::default_for("project")).build()
    }

    fn field_ctx(source: DataSource) -> ParseContext {
        ParseContext::root(source, 20).child_field("f").unwrap()
    }

    #[test]
    fn test_server_timestamp_records_transform() {
        let mut acc = ParseAccumulator::new(DataSource::Set);
        reader()
            .parse_sentinel(&Sentinel::server_timestamp(), &field_ctx(DataSource::Set), &mut acc)
            .unwrap();

        let transforms = acc.transforms();
        assert_eq!(transforms.len(), 1);
        assert_eq!(transforms[0].path, FieldPath::from_dot_separated("f").unwrap());
        assert_eq!(transforms[0].operation, TransformOperation::ServerTimestamp);
    }

    #[test]
    fn test_increment_operand_must_be_numeric() {
        let mut acc = ParseAccumulator::new(DataSource::Set);
        let result = reader().parse_sentinel(
            &Sentinel::increment("one"),
            &field_ctx(DataSource::Set),
            &mut acc,
        );
        assert!(matches!(
            result,
            Err(UserDataError::InvalidIncrementOperand { ref type_name, .. }) if type_name == "string"
        ));

        reader()
            .parse_sentinel(&Sentinel::increment(2.5), &field_ctx(DataSource::Set), &mut acc)
            .unwrap();
        assert_eq!(
            acc.transforms()[0].operation,
            TransformOperation::Increment(Number::Double(2.5))
        );
    }

    #[test]
    fn test_sentinel_inside_operand() {
        let mut acc = ParseAccumulator::new(DataSource::Set);
        let nested = Sentinel::array_union([RawValue::Sentinel(Sentinel::server_timestamp())]);
        let result = reader().parse_sentinel(&nested, &field_ctx(DataSource::Set), &mut acc);
        assert!(matches!(
            result,
            Err(UserDataError::InvalidSentinelNesting {
                sentinel: SentinelKind::ServerTimestamp,
                ..
            })
        ));
    }

    #[test]
    fn test_array_union_rejects_nested_arrays() {
        let mut acc = ParseAccumulator::new(DataSource::Set);
        let nested = Sentinel::array_union([RawValue::array([1, 2])]);
        let result = reader().parse_sentinel(&nested, &field_ctx(DataSource::Set), &mut acc);
        assert!(matches!(result, Err(UserDataError::NestedArray { .. })));
    }

    #[test]
    fn test_delete_placement() {
        let mut acc = ParseAccumulator::new(DataSource::MergeSet);
        reader()
            .parse_sentinel(&Sentinel::delete(), &field_ctx(DataSource::MergeSet), &mut acc)
            .unwrap();
        assert!(acc.transforms()[0].operation.is_delete());

        for source in [DataSource::Set, DataSource::Update] {
            let mut acc = ParseAccumulator::new(source);
            let result = reader().parse_sentinel(&Sentinel::delete(), &field_ctx(source), &mut acc);
            assert!(matches!(result, Err(UserDataError::InvalidDeleteNesting { .. })));
        }
    }

    #[test]
    fn test_sentinel_in_query() {
        let mut acc = ParseAccumulator::new(DataSource::Argument);
        let result = reader().parse_sentinel(
            &Sentinel::server_timestamp(),
            &ParseContext::root(DataSource::Argument, 20),
            &mut acc,
        );
        assert!(matches!(result, Err(UserDataError::InvalidSentinelInQuery { .. })));
    }
}
