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

//! Entry points that turn a whole write or query value into parsed output

use serde::Serialize;

use crate::core::{Result, UserDataError};
use crate::model::{
    FieldMask, FieldPath, FieldTransform, FieldValue, ObjectValue, Probe, RawFieldPath, RawValue,
    Sentinel, TransformOperation,
};

use super::UserDataReader;
use super::context::{DataSource, ParseContext};
use super::mask_builder::ParseAccumulator;

/// Parsed result of `set()`, with or without merge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSetData {
    data: ObjectValue,
    field_mask: Option<FieldMask>,
    field_transforms: Vec<FieldTransform>,
}

impl ParsedSetData {
    /// Plain values to write
    pub fn data(&self) -> &ObjectValue {
        &self.data
    }

    /// Present for merges only
    pub fn field_mask(&self) -> Option<&FieldMask> {
        self.field_mask.as_ref()
    }

    pub fn field_transforms(&self) -> &[FieldTransform] {
        &self.field_transforms
    }

    pub fn is_merge(&self) -> bool {
        self.field_mask.is_some()
    }

    pub fn into_parts(self) -> (ObjectValue, Option<FieldMask>, Vec<FieldTransform>) {
        (self.data, self.field_mask, self.field_transforms)
    }
}

/// Parsed result of `update()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedUpdateData {
    data: ObjectValue,
    field_mask: FieldMask,
    field_transforms: Vec<FieldTransform>,
}

impl ParsedUpdateData {
    pub fn data(&self) -> &ObjectValue {
        &self.data
    }

    /// One entry per update key
    pub fn field_mask(&self) -> &FieldMask {
        &self.field_mask
    }

    pub fn field_transforms(&self) -> &[FieldTransform] {
        &self.field_transforms
    }

    pub fn into_parts(self) -> (ObjectValue, FieldMask, Vec<FieldTransform>) {
        (self.data, self.field_mask, self.field_transforms)
    }
}

impl UserDataReader {
    /// Parse the data of a non-merge `set()`
    ///
    /// The document is replaced as a whole, so no mask is produced.
    /// `FieldValue.delete()` is rejected anywhere in the input.
    pub fn parsed_set_data(&self, input: &RawValue) -> Result<ParsedSetData> {
        log::debug!("Parsing set() data");
        let mut acc = ParseAccumulator::new(DataSource::Set);
        let result = self
            .parse_root_map(input, DataSource::Set, &mut acc)
            .map(|data| ParsedSetData {
                data,
                field_mask: None,
                field_transforms: acc.into_transforms(),
            });
        result
            .inspect(|parsed| {
                log::debug!(
                    "set() parsed: {} fields, {} transforms",
                    parsed.data.len(),
                    parsed.field_transforms.len()
                )
            })
            .inspect_err(|err| log::debug!("set() data rejected: {err}"))
    }

    /// Parse the data of `set()` with merge
    ///
    /// Without `field_mask` the mask is every leaf the input touches,
    /// including transform paths. With it, each entry must name data present
    /// in the input, and transforms outside the mask are dropped.
    pub fn parsed_merge_data(
        &self,
        input: &RawValue,
        field_mask: Option<&[RawFieldPath]>,
    ) -> Result<ParsedSetData> {
        log::debug!(
            "Parsing merge set() data ({} mask)",
            if field_mask.is_some() { "explicit" } else { "inferred" }
        );
        self.parse_merge(input, field_mask)
            .inspect(|parsed| {
                log::debug!(
                    "merge parsed: {} mask entries, {} transforms",
                    parsed.field_mask.as_ref().map_or(0, FieldMask::len),
                    parsed.field_transforms.len()
                )
            })
            .inspect_err(|err| log::debug!("merge data rejected: {err}"))
    }

    /// Parse the data of `update()`
    ///
    /// Top-level keys are dot-separated field paths. The mask holds exactly
    /// one entry per key.
    pub fn parsed_update_data(&self, input: &RawValue) -> Result<ParsedUpdateData> {
        log::debug!("Parsing update() data");
        let root = self.pre_convert(input);
        let Probe::Map(map) = root.classify() else {
            let err = UserDataError::NonObjectRoot {
                method: DataSource::Update.method_name(),
                type_name: root.type_name().to_string(),
            };
            log::debug!("update() data rejected: {err}");
            return Err(err);
        };

        let entries = map
            .iter()
            .map(|(key, value)| (RawFieldPath::Dotted(key.clone()), value));
        self.parse_update_entries(entries)
            .inspect_err(|err| log::debug!("update() data rejected: {err}"))
    }

    /// Parse `update()` arguments given as field/value pairs
    pub fn parsed_update_fields<I>(&self, fields: I) -> Result<ParsedUpdateData>
    where
        I: IntoIterator<Item = (RawFieldPath, RawValue)>,
    {
        log::debug!("Parsing update() field/value pairs");
        let fields: Vec<(RawFieldPath, RawValue)> = fields.into_iter().collect();
        let entries = fields.iter().map(|(path, value)| (path.clone(), value));
        self.parse_update_entries(entries)
            .inspect_err(|err| log::debug!("update() fields rejected: {err}"))
    }

    /// Parse a query filter or cursor value
    ///
    /// `allow_arrays` permits arrays directly inside the top-level array, as
    /// needed by `in` and `array-contains-any` filters.
    pub fn parsed_query_value(&self, input: &RawValue, allow_arrays: bool) -> Result<FieldValue> {
        let source = if allow_arrays {
            DataSource::ArrayArgument
        } else {
            DataSource::Argument
        };
        log::debug!("Parsing query value ({source:?})");

        let ctx = ParseContext::root(source, self.config.max_depth);
        let mut acc = ParseAccumulator::new(source);
        let value = self
            .parse_data(input, &ctx, &mut acc)
            .inspect_err(|err| log::debug!("query value rejected: {err}"))?;
        // Sentinels fail before a value could be skipped.
        Ok(value.unwrap_or(FieldValue::Null))
    }

    fn parse_merge(
        &self,
        input: &RawValue,
        field_mask: Option<&[RawFieldPath]>,
    ) -> Result<ParsedSetData> {
        let mut acc = ParseAccumulator::new(DataSource::MergeSet);
        let data = self.parse_root_map(input, DataSource::MergeSet, &mut acc)?;

        let (mask, transforms) = match field_mask {
            None => (acc.build_mask(), acc.into_transforms()),
            Some(raw_paths) => {
                let paths = raw_paths
                    .iter()
                    .map(RawFieldPath::resolve)
                    .collect::<Result<Vec<_>>>()?;
                let mask = acc.build_explicit_mask(&paths)?;
                let transforms = acc
                    .into_transforms()
                    .into_iter()
                    .filter(|transform| mask.covers(&transform.path))
                    .collect();
                (mask, transforms)
            }
        };

        Ok(ParsedSetData {
            data,
            field_mask: Some(mask),
            field_transforms: transforms,
        })
    }

    fn parse_root_map(
        &self,
        input: &RawValue,
        source: DataSource,
        acc: &mut ParseAccumulator,
    ) -> Result<ObjectValue> {
        let root = self.pre_convert(input);
        match root.classify() {
            Probe::Map(map) => {
                let ctx = ParseContext::root(source, self.config.max_depth);
                ctx.check_depth()?;
                self.parse_map(map, &ctx, acc)
            }
            _ => Err(UserDataError::NonObjectRoot {
                method: source.method_name(),
                type_name: root.type_name().to_string(),
            }),
        }
    }

    fn parse_update_entries<'a, I>(&self, entries: I) -> Result<ParsedUpdateData>
    where
        I: IntoIterator<Item = (RawFieldPath, &'a RawValue)>,
    {
        let root = ParseContext::root(DataSource::Update, self.config.max_depth);
        let mut acc = ParseAccumulator::new(DataSource::Update);
        let mut data = ObjectValue::new();
        let mut keys: Vec<(FieldPath, bool)> = Vec::new();

        for (raw_path, value) in entries {
            let path = raw_path.resolve()?;
            let ctx = root.child_path(&path)?;
            ctx.check_depth()?;

            let value = self.pre_convert(value);
            let is_transform = matches!(value.classify(), Probe::Sentinel(_));
            // Keys are checked before their values are walked.
            check_update_key(&path, is_transform, &keys)?;
            match value.classify() {
                // Only a top-level key may carry delete.
                Probe::Sentinel(Sentinel::Delete) => {
                    acc.add_transform(path.clone(), TransformOperation::Delete)?
                }
                _ => {
                    if let Some(parsed) = self.parse_converted(&value, &ctx, &mut acc)? {
                        data.set(&path, parsed);
                    }
                }
            }
            keys.push((path, is_transform));
        }

        if keys.is_empty() {
            return Err(UserDataError::EmptyUpdate);
        }

        let parsed = ParsedUpdateData {
            data,
            field_mask: FieldMask::new(keys.into_iter().map(|(path, _)| path)),
            field_transforms: acc.into_transforms(),
        };
        log::debug!(
            "update() parsed: {} keys, {} transforms",
            parsed.field_mask.len(),
            parsed.field_transforms.len()
        );
        Ok(parsed)
    }
}

/// Reject a key equal to an earlier one or in a parent/child relation with it
fn check_update_key(
    path: &FieldPath,
    is_transform: bool,
    earlier: &[(FieldPath, bool)],
) -> Result<()> {
    let Some((other, other_is_transform)) = earlier.iter().find(|(other, _)| path.overlaps(other))
    else {
        return Ok(());
    };
    Err(if is_transform || *other_is_transform {
        UserDataError::TransformOverlap {
            path: path.clone(),
            other: other.clone(),
        }
    } else {
        UserDataError::ConflictingFieldPaths {
            path: path.clone(),
            other: other.clone(),
        }
    })
}
