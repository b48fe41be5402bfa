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

//! Error type for user data parsing

use thiserror::Error;

use super::error_code::*;
use crate::model::{DatabaseId, FieldPath, SentinelKind};

/// Result type for user data parsing
pub type Result<T> = std::result::Result<T, UserDataError>;

/// Renders the " (found in field x)" suffix used by every located error.
fn describe(path: &Option<FieldPath>) -> String {
    match path {
        Some(path) => format!(" (found in field {path})"),
        None => String::new(),
    }
}

/// Errors raised while converting caller data into the document model
///
/// The first error hit during the depth-first walk aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UserDataError {
    /// A field path could not be resolved
    #[error("Invalid field path ({input}). {reason}{}", describe(.path))]
    InvalidPath {
        /// The raw path as supplied
        input: String,
        /// Why it was rejected
        reason: String,
        /// Enclosing field, when the path was a map key
        path: Option<FieldPath>,
    },

    /// A value kind the converter cannot represent
    #[error("Unsupported type: {type_name}{}", describe(.path))]
    UnsupportedType {
        type_name: String,
        path: Option<FieldPath>,
    },

    /// Sentinel inside an array or inside another sentinel's operand
    #[error("{sentinel} {reason}{}", describe(.path))]
    InvalidSentinelNesting {
        sentinel: SentinelKind,
        reason: String,
        path: Option<FieldPath>,
    },

    /// Increment operand is not a number
    #[error("FieldValue.increment() requires a numeric operand, found {type_name}{}", describe(.path))]
    InvalidIncrementOperand {
        type_name: String,
        path: Option<FieldPath>,
    },

    /// Sentinel used where only literal values are allowed
    #[error("{sentinel} can only be used with set() and update(){}", describe(.path))]
    InvalidSentinelInQuery {
        sentinel: SentinelKind,
        path: Option<FieldPath>,
    },

    /// Delete used below the top level of an update, or in a plain set
    #[error("FieldValue.delete() {reason}{}", describe(.path))]
    InvalidDeleteNesting {
        reason: String,
        path: Option<FieldPath>,
    },

    /// Reference to a document of another database
    #[error("Document reference is for database {found} but should be for database {expected}{}", describe(.path))]
    CrossDatabaseReference {
        found: DatabaseId,
        expected: DatabaseId,
        path: Option<FieldPath>,
    },

    /// Number that cannot be stored without loss (strict mode only)
    #[error("Numeric value {value} cannot be represented without loss of precision{}", describe(.path))]
    NumericRange {
        value: String,
        path: Option<FieldPath>,
    },

    /// Input nested deeper than the configured limit
    #[error("Input exceeds the maximum nesting depth of {max_depth}{}", describe(.path))]
    MaxDepthExceeded {
        max_depth: usize,
        path: Option<FieldPath>,
    },

    /// Merge mask entry that names nothing in the input
    #[error("Field '{field}' is specified in your field mask but missing from your input data")]
    MissingFieldForMerge { field: FieldPath },

    /// Root of a write is not a map
    #[error("Data passed to {method}() must be a map, found {type_name}")]
    NonObjectRoot {
        method: &'static str,
        type_name: String,
    },

    /// Update without fields
    #[error("update() requires at least one field")]
    EmptyUpdate,

    /// Array directly inside an array
    #[error("Nested arrays are not supported{}", describe(.path))]
    NestedArray { path: Option<FieldPath> },

    /// Transform sharing or nesting its path with another transform or a value
    #[error("Transform at '{path}' overlaps with '{other}' in the same write")]
    TransformOverlap { path: FieldPath, other: FieldPath },

    /// Two update keys naming the same field or a parent and its child
    #[error("Field '{path}' conflicts with field '{other}' in the same update")]
    ConflictingFieldPaths { path: FieldPath, other: FieldPath },

    /// Out-of-range timestamp, geo point or document key
    #[error("{message}{}", describe(.path))]
    InvalidValue {
        message: String,
        path: Option<FieldPath>,
    },
}

impl UserDataError {
    /// Create an invalid path error
    pub fn invalid_path(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            input: input.into(),
            reason: reason.into(),
            path: None,
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
            path: None,
        }
    }

    /// Attach a field location to errors that were raised without one
    pub fn at(mut self, location: Option<FieldPath>) -> Self {
        match &mut self {
            Self::InvalidPath { path, .. }
            | Self::UnsupportedType { path, .. }
            | Self::InvalidSentinelNesting { path, .. }
            | Self::InvalidIncrementOperand { path, .. }
            | Self::InvalidSentinelInQuery { path, .. }
            | Self::InvalidDeleteNesting { path, .. }
            | Self::CrossDatabaseReference { path, .. }
            | Self::NumericRange { path, .. }
            | Self::MaxDepthExceeded { path, .. }
            | Self::NestedArray { path }
            | Self::InvalidValue { path, .. } => {
                if path.is_none() {
                    *path = location;
                }
            }
            _ => {}
        }
        self
    }

    /// The field the error was found in, when known
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::InvalidPath { path, .. }
            | Self::UnsupportedType { path, .. }
            | Self::InvalidSentinelNesting { path, .. }
            | Self::InvalidIncrementOperand { path, .. }
            | Self::InvalidSentinelInQuery { path, .. }
            | Self::InvalidDeleteNesting { path, .. }
            | Self::CrossDatabaseReference { path, .. }
            | Self::NumericRange { path, .. }
            | Self::MaxDepthExceeded { path, .. }
            | Self::NestedArray { path }
            | Self::InvalidValue { path, .. } => path.as_ref(),
            Self::MissingFieldForMerge { field } => Some(field),
            Self::TransformOverlap { path, .. } | Self::ConflictingFieldPaths { path, .. } => {
                Some(path)
            }
            Self::NonObjectRoot { .. } | Self::EmptyUpdate => None,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPath { .. } => UD0001,
            Self::MissingFieldForMerge { .. } => UD0002,
            Self::ConflictingFieldPaths { .. } => UD0003,
            Self::UnsupportedType { .. } => UD0020,
            Self::NumericRange { .. } => UD0021,
            Self::CrossDatabaseReference { .. } => UD0022,
            Self::NestedArray { .. } => UD0023,
            Self::MaxDepthExceeded { .. } => UD0024,
            Self::InvalidValue { .. } => UD0025,
            Self::InvalidSentinelNesting { .. } => UD0040,
            Self::InvalidIncrementOperand { .. } => UD0041,
            Self::InvalidSentinelInQuery { .. } => UD0042,
            Self::InvalidDeleteNesting { .. } => UD0043,
            Self::TransformOverlap { .. } => UD0044,
            Self::NonObjectRoot { .. } => UD0060,
            Self::EmptyUpdate => UD0061,
        }
    }

    /// Get error information with help text
    pub fn error_info(&self) -> &'static ErrorInfo {
        self.error_code().info()
    }
}
