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

//! Field transforms extracted from sentinels

use serde::{Deserialize, Serialize};

use super::field_path::FieldPath;
use super::sentinel::SentinelKind;
use super::types::Number;
use super::value::FieldValue;

/// Server-evaluated operation on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "operand", rename_all = "snake_case")]
pub enum TransformOperation {
    /// Set the field to the commit time
    ServerTimestamp,
    /// Add to the current numeric value
    Increment(Number),
    /// Append elements not already present
    ArrayUnion(Vec<FieldValue>),
    /// Remove all instances of the elements
    ArrayRemove(Vec<FieldValue>),
    /// Remove the field
    Delete,
}

impl TransformOperation {
    /// Sentinel kind that produces this operation
    pub fn kind(&self) -> SentinelKind {
        match self {
            TransformOperation::ServerTimestamp => SentinelKind::ServerTimestamp,
            TransformOperation::Increment(_) => SentinelKind::Increment,
            TransformOperation::ArrayUnion(_) => SentinelKind::ArrayUnion,
            TransformOperation::ArrayRemove(_) => SentinelKind::ArrayRemove,
            TransformOperation::Delete => SentinelKind::Delete,
        }
    }

    /// Deletes remove the field instead of computing a new value
    pub fn is_delete(&self) -> bool {
        matches!(self, TransformOperation::Delete)
    }
}

/// A transform applied to the field at `path`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTransform {
    pub path: FieldPath,
    pub operation: TransformOperation,
}

impl FieldTransform {
    pub fn new(path: FieldPath, operation: TransformOperation) -> Self {
        Self { path, operation }
    }
}
