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

//! Accumulation of touched paths and transforms during one parse

use crate::core::{Result, UserDataError};
use crate::model::{FieldMask, FieldPath, FieldTransform, TransformOperation};

use super::context::DataSource;

/// Mutable side channel of a single parse
///
/// Owned by exactly one entry-point call and never shared.
#[derive(Debug)]
pub(crate) struct ParseAccumulator {
    data_source: DataSource,
    touched: Vec<FieldPath>,
    transforms: Vec<FieldTransform>,
}

impl ParseAccumulator {
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            touched: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Record a leaf written with a plain value
    pub fn record_touched(&mut self, path: FieldPath) {
        self.touched.push(path);
    }

    /// Record a transform; the path joins the mask as well
    ///
    /// Fails if the path overlaps an earlier transform or equals a plain
    /// value's path.
    pub fn add_transform(&mut self, path: FieldPath, operation: TransformOperation) -> Result<()> {
        if let Some(earlier) = self.transforms.iter().find(|other| other.path.overlaps(&path)) {
            return Err(UserDataError::TransformOverlap {
                path,
                other: earlier.path.clone(),
            });
        }
        if let Some(plain) = self.touched.iter().find(|p| **p == path) {
            return Err(UserDataError::TransformOverlap {
                path,
                other: plain.clone(),
            });
        }
        log::trace!(
            "{} transform at '{}' for {}()",
            operation.kind(),
            path,
            self.data_source.method_name()
        );
        self.transforms.push(FieldTransform::new(path, operation));
        Ok(())
    }

    #[cfg(test)]
    pub fn transforms(&self) -> &[FieldTransform] {
        &self.transforms
    }

    pub fn into_transforms(self) -> Vec<FieldTransform> {
        self.transforms
    }

    /// True if `path` is a touched or transformed path, or an ancestor of one
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.all_paths().any(|candidate| path.is_prefix_of(candidate))
    }

    /// Mask inferred from everything the data touched
    pub fn build_mask(&self) -> FieldMask {
        FieldMask::new(self.all_paths().cloned())
    }

    /// Mask from caller-supplied paths; each must name data that is present
    pub fn build_explicit_mask(&self, paths: &[FieldPath]) -> Result<FieldMask> {
        if let Some(missing) = paths.iter().find(|path| !self.contains(path)) {
            return Err(UserDataError::MissingFieldForMerge {
                field: missing.clone(),
            });
        }
        Ok(FieldMask::coalesced(paths.iter().cloned()))
    }

    fn all_paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.touched
            .iter()
            .chain(self.transforms.iter().map(|transform| &transform.path))
    }
}
