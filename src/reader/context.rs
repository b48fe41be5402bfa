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

//! Parse context threaded through the recursive descent

use crate::core::{Result, UserDataError};
use crate::model::field_path::is_reserved_segment;
use crate::model::{FieldPath, SentinelKind};

/// Which API call the data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// Non-merge `set()`
    Set,
    /// `set()` with merge
    MergeSet,
    /// `update()`
    Update,
    /// Query filter or cursor value
    Argument,
    /// Query operand that may directly contain arrays (`in`, `array-contains-any`)
    ArrayArgument,
}

impl DataSource {
    /// Writes record transforms and mask entries; arguments do not
    pub fn is_write(self) -> bool {
        matches!(
            self,
            DataSource::Set | DataSource::MergeSet | DataSource::Update
        )
    }

    /// Name of the API method, for error messages
    pub fn method_name(self) -> &'static str {
        match self {
            DataSource::Set | DataSource::MergeSet => "set",
            DataSource::Update => "update",
            DataSource::Argument | DataSource::ArrayArgument => "where",
        }
    }
}

/// Immutable position of the parser inside the input
///
/// Every descent creates a new context; nothing is shared or mutated, so a
/// reader can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub(crate) struct ParseContext {
    data_source: DataSource,
    /// Empty at the root. Inside arrays it stays at the enclosing field.
    path: FieldPath,
    depth: usize,
    max_depth: usize,
    in_array: bool,
    array_element: bool,
    operand_of: Option<SentinelKind>,
}

impl ParseContext {
    pub fn root(data_source: DataSource, max_depth: usize) -> Self {
        Self {
            data_source,
            path: FieldPath::empty(),
            depth: 0,
            max_depth,
            in_array: false,
            array_element: false,
            operand_of: None,
        }
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn is_write(&self) -> bool {
        self.data_source.is_write()
    }

    /// Anywhere below an array, including sentinel operands
    pub fn in_array(&self) -> bool {
        self.in_array
    }

    /// Direct child of an array
    pub fn is_array_element(&self) -> bool {
        self.array_element
    }

    /// The sentinel whose operand is being parsed
    pub fn operand_of(&self) -> Option<SentinelKind> {
        self.operand_of
    }

    /// Path to report in errors; `None` at the root
    pub fn error_path(&self) -> Option<FieldPath> {
        (!self.path.is_empty()).then(|| self.path.clone())
    }

    /// Path to add to the field mask, if this position contributes one
    pub fn mask_path(&self) -> Option<&FieldPath> {
        (self.is_write() && !self.in_array && !self.path.is_empty()).then_some(&self.path)
    }

    pub fn check_depth(&self) -> Result<()> {
        if self.depth > self.max_depth {
            return Err(UserDataError::MaxDepthExceeded {
                max_depth: self.max_depth,
                path: self.error_path(),
            });
        }
        Ok(())
    }

    /// Context for the value of map key `name`
    pub fn child_field(&self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(UserDataError::InvalidPath {
                input: String::new(),
                reason: "Document fields must not be empty".to_string(),
                path: self.error_path(),
            });
        }
        self.validate_segment(name)?;

        let path = if self.in_array {
            self.path.clone()
        } else {
            self.path.child(name)
        };
        Ok(Self {
            path,
            depth: self.depth + 1,
            array_element: false,
            ..self.clone()
        })
    }

    /// Context for a top-level update key, which may span several segments
    pub fn child_path(&self, path: &FieldPath) -> Result<Self> {
        for segment in path.segments() {
            self.validate_segment(segment)?;
        }
        Ok(Self {
            path: self.path.append(path),
            depth: self.depth + path.len(),
            array_element: false,
            ..self.clone()
        })
    }

    /// Context for an element of the array at this position
    pub fn child_element(&self) -> Self {
        Self {
            depth: self.depth + 1,
            in_array: true,
            array_element: true,
            ..self.clone()
        }
    }

    /// Context for the operand of the sentinel at this position
    ///
    /// Operands are parsed like query arguments, so nested sentinels and
    /// reserved-name checks behave as they do for query values.
    pub fn operand_context(&self, kind: SentinelKind) -> Self {
        Self {
            data_source: DataSource::Argument,
            path: self.path.clone(),
            depth: self.depth + 1,
            max_depth: self.max_depth,
            in_array: true,
            array_element: matches!(kind, SentinelKind::ArrayUnion | SentinelKind::ArrayRemove),
            operand_of: Some(kind),
        }
    }

    fn validate_segment(&self, segment: &str) -> Result<()> {
        if self.is_write() && is_reserved_segment(segment) {
            return Err(UserDataError::InvalidPath {
                input: segment.to_string(),
                reason: "Document fields cannot begin and end with \"__\"".to_string(),
                path: self.error_path(),
            });
        }
        Ok(())
    }
}
