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

//! Error code index for user data parsing (UD0001, UD0002, ...)
//!
//! Every [`UserDataError`](super::error::UserDataError) maps to one stable code.
//! Codes are grouped into ranges by category so callers can branch on the
//! category without matching every variant.

use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Field path errors (UD0001-UD0019)
    Path,
    /// Value conversion errors (UD0020-UD0039)
    Value,
    /// Sentinel placement errors (UD0040-UD0059)
    Sentinel,
    /// Write shape errors (UD0060-UD0079)
    Write,
}

/// Error code in the `UD0001` style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Get the full error code string (e.g., "UD0001")
    pub fn code_str(&self) -> String {
        format!("UD{:04}", self.code)
    }

    /// Get error information from the registry
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_REGISTRY.get_error_info(self)
    }

    /// Get error category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self.code {
            1..=19 => ErrorCategory::Path,
            20..=39 => ErrorCategory::Value,
            40..=59 => ErrorCategory::Sentinel,
            _ => ErrorCategory::Write,
        }
    }

    /// Get human-readable title for this error code
    pub fn description(&self) -> &'static str {
        self.info().title
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UD{:04}", self.code)
    }
}

/// Error information with help text
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error code number
    pub code: u16,
    /// Human-readable error title
    pub title: &'static str,
    /// Detailed description of the error
    pub description: &'static str,
    /// Help information and suggested solutions
    pub help: &'static str,
}

impl ErrorInfo {
    pub const fn new(
        code: u16,
        title: &'static str,
        description: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            code,
            title,
            description,
            help,
        }
    }
}

/// Central registry of error definitions
pub struct ErrorRegistry;

impl ErrorRegistry {
    /// Get error information for a given error code
    pub fn get_error_info(&self, error_code: &ErrorCode) -> &'static ErrorInfo {
        match error_code.code {
            // Path errors
            1 => &UD0001_INFO,
            2 => &UD0002_INFO,
            3 => &UD0003_INFO,

            // Value errors
            20 => &UD0020_INFO,
            21 => &UD0021_INFO,
            22 => &UD0022_INFO,
            23 => &UD0023_INFO,
            24 => &UD0024_INFO,
            25 => &UD0025_INFO,

            // Sentinel errors
            40 => &UD0040_INFO,
            41 => &UD0041_INFO,
            42 => &UD0042_INFO,
            43 => &UD0043_INFO,
            44 => &UD0044_INFO,

            // Write shape errors
            60 => &UD0060_INFO,
            61 => &UD0061_INFO,

            _ => &UNKNOWN_ERROR_INFO,
        }
    }
}

/// Global error registry instance
pub static ERROR_REGISTRY: ErrorRegistry = ErrorRegistry;

// Path errors (UD0001-UD0019)
pub const UD0001: ErrorCode = ErrorCode::new(1); // Invalid field path
pub const UD0002: ErrorCode = ErrorCode::new(2); // Merge field missing from input
pub const UD0003: ErrorCode = ErrorCode::new(3); // Conflicting update paths

// Value errors (UD0020-UD0039)
pub const UD0020: ErrorCode = ErrorCode::new(20); // Unsupported type
pub const UD0021: ErrorCode = ErrorCode::new(21); // Numeric value out of range
pub const UD0022: ErrorCode = ErrorCode::new(22); // Reference to another database
pub const UD0023: ErrorCode = ErrorCode::new(23); // Nested arrays
pub const UD0024: ErrorCode = ErrorCode::new(24); // Maximum nesting depth exceeded
pub const UD0025: ErrorCode = ErrorCode::new(25); // Invalid scalar value

// Sentinel errors (UD0040-UD0059)
pub const UD0040: ErrorCode = ErrorCode::new(40); // Sentinel in unsupported position
pub const UD0041: ErrorCode = ErrorCode::new(41); // Non-numeric increment operand
pub const UD0042: ErrorCode = ErrorCode::new(42); // Sentinel in query value
pub const UD0043: ErrorCode = ErrorCode::new(43); // Misplaced delete
pub const UD0044: ErrorCode = ErrorCode::new(44); // Overlapping transforms

// Write shape errors (UD0060-UD0079)
pub const UD0060: ErrorCode = ErrorCode::new(60); // Root is not a map
pub const UD0061: ErrorCode = ErrorCode::new(61); // Empty update

static UD0001_INFO: ErrorInfo = ErrorInfo::new(
    1,
    "Invalid field path",
    "A field path is empty, contains an empty segment, uses a reserved character outside back-quotes, or names a reserved field.",
    "Separate segments with '.', quote segments containing '~', '*', '/', '[', ']' or '.' with back-quotes, and avoid field names that begin and end with '__'.",
);

static UD0002_INFO: ErrorInfo = ErrorInfo::new(
    2,
    "Merge field missing from input",
    "A path listed in the merge field mask does not name any field present in the data being written.",
    "Only list fields that appear in the input, or one of their parents. Remove the entry or add the field to the data.",
);

static UD0003_INFO: ErrorInfo = ErrorInfo::new(
    3,
    "Conflicting update paths",
    "Two keys of an update name the same field, or one names a parent of the other.",
    "Write the nested field through a single key, either the parent map or the dotted child path.",
);

static UD0020_INFO: ErrorInfo = ErrorInfo::new(
    20,
    "Unsupported type",
    "A value has a host type the converter does not understand and the pre-conversion hook did not normalize it.",
    "Convert the value to a supported kind before writing it, or install a pre-conversion hook that does.",
);

static UD0021_INFO: ErrorInfo = ErrorInfo::new(
    21,
    "Numeric value out of range",
    "A number cannot be stored as a 64-bit integer or a double without losing precision.",
    "Disable strict numeric mode to accept a best-effort double, or store the value as a string.",
);

static UD0022_INFO: ErrorInfo = ErrorInfo::new(
    22,
    "Reference to another database",
    "A document reference belongs to a different database than the one being written to.",
    "References can only point at documents of the same database. Rebuild the reference from the target database.",
);

static UD0023_INFO: ErrorInfo = ErrorInfo::new(
    23,
    "Nested arrays are not supported",
    "An array appears directly inside another array.",
    "Wrap the inner array in a map, or pass allow_arrays for 'in' style query operands.",
);

static UD0024_INFO: ErrorInfo = ErrorInfo::new(
    24,
    "Maximum nesting depth exceeded",
    "The input is nested deeper than the configured limit. Self-referencing inputs also end here.",
    "Flatten the data, raise max_depth in the reader configuration, or check the pre-conversion hook for cycles.",
);

static UD0025_INFO: ErrorInfo = ErrorInfo::new(
    25,
    "Invalid scalar value",
    "A timestamp, geo point or document key is outside the range the database accepts.",
    "Timestamps must lie between year 1 and 9999, latitudes in [-90, 90], longitudes in [-180, 180], and document keys need an even number of segments.",
);

static UD0040_INFO: ErrorInfo = ErrorInfo::new(
    40,
    "Sentinel in unsupported position",
    "A field value sentinel was used inside an array or inside the operand of another sentinel.",
    "Sentinels may only appear as map values. Move the sentinel to its own field.",
);

static UD0041_INFO: ErrorInfo = ErrorInfo::new(
    41,
    "Invalid increment operand",
    "FieldValue.increment() was given an operand that is not a number.",
    "Pass an integer or a floating point operand.",
);

static UD0042_INFO: ErrorInfo = ErrorInfo::new(
    42,
    "Sentinel in query value",
    "A field value sentinel was used as a query filter or cursor value.",
    "Sentinels can only be used with set() and update(). Use a literal value in queries.",
);

static UD0043_INFO: ErrorInfo = ErrorInfo::new(
    43,
    "Misplaced delete",
    "FieldValue.delete() was nested inside a map of an update, or used in a set() without merge.",
    "Use a dotted key such as 'a.b' to delete a nested field in an update, or use set() with merge.",
);

static UD0044_INFO: ErrorInfo = ErrorInfo::new(
    44,
    "Overlapping transforms",
    "A transform shares its path with another transform or a literal value, or one lies beneath the other.",
    "Each field can receive either one transform or one value per write.",
);

static UD0060_INFO: ErrorInfo = ErrorInfo::new(
    60,
    "Data is not a map",
    "Documents are maps, so data passed to set() or update() must be a map at the root.",
    "Wrap the value in a map keyed by the field name.",
);

static UD0061_INFO: ErrorInfo = ErrorInfo::new(
    61,
    "Empty update",
    "update() was called without any fields.",
    "Pass at least one field to update.",
);

static UNKNOWN_ERROR_INFO: ErrorInfo = ErrorInfo::new(
    0,
    "Unknown error",
    "An error code with no registered description.",
    "This is a bug in the error registry.",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(UD0001.code_str(), "UD0001");
        assert_eq!(UD0044.to_string(), "UD0044");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(UD0001.category(), ErrorCategory::Path);
        assert_eq!(UD0003.category(), ErrorCategory::Path);
        assert_eq!(UD0020.category(), ErrorCategory::Value);
        assert_eq!(UD0025.category(), ErrorCategory::Value);
        assert_eq!(UD0040.category(), ErrorCategory::Sentinel);
        assert_eq!(UD0044.category(), ErrorCategory::Sentinel);
        assert_eq!(UD0060.category(), ErrorCategory::Write);
    }

    #[test]
    fn test_every_code_is_registered() {
        for code in [1, 2, 3, 20, 21, 22, 23, 24, 25, 40, 41, 42, 43, 44, 60, 61] {
            let info = ErrorCode::new(code).info();
            assert_eq!(info.code, code);
            assert!(!info.help.is_empty());
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(ErrorCode::new(999).description(), "Unknown error");
    }
}
