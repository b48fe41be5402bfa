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

//! Field paths and the path resolver
//!
//! A [`FieldPath`] is an ordered, non-empty sequence of non-empty segments that
//! identifies a location inside a document. Callers name fields either with a
//! dotted string (`"address.city"`) or with explicit segments
//! (`["address", "city"]`); both resolve to the same canonical path.
//!
//! Dotted strings may quote a segment with back-quotes to include the
//! separator or a reserved character (`` a.`b.c` `` has the two segments
//! `a` and `b.c`), and `\` escapes the next character anywhere.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

use crate::core::{Result, UserDataError};

/// Characters that must be quoted or escaped in a dotted path
const RESERVED_CHARACTERS: [char; 5] = ['~', '*', '/', '[', ']'];

/// Canonical path to a field inside a document
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: SmallVec<[String; 4]>,
}

impl FieldPath {
    /// Build a path from pre-split segments.
    ///
    /// Segments are taken verbatim, so they may contain `.` or any other
    /// character. Only emptiness is rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: SmallVec<[String; 4]> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(UserDataError::invalid_path(
                "",
                "Field paths must contain at least one segment",
            ));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(UserDataError::invalid_path(
                segments.join("."),
                "Field path segments must not be empty",
            ));
        }
        Ok(Self { segments })
    }

    /// Parse a dotted path such as `"a.b"` or ``"a.`b.c`"``.
    pub fn from_dot_separated(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(UserDataError::invalid_path(path, "Paths must not be empty"));
        }

        let mut segments: SmallVec<[String; 4]> = SmallVec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = path.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => {
                        return Err(UserDataError::invalid_path(
                            path,
                            "Paths must not end with an escape character",
                        ));
                    }
                },
                '`' => quoted = !quoted,
                '.' if !quoted => {
                    if current.is_empty() {
                        return Err(empty_segment(path));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                c if !quoted && RESERVED_CHARACTERS.contains(&c) => {
                    return Err(UserDataError::invalid_path(
                        path,
                        "Paths must not contain '~', '*', '/', '[', or ']'",
                    ));
                }
                c => current.push(c),
            }
        }

        if quoted {
            return Err(UserDataError::invalid_path(
                path,
                "Paths must not contain an unterminated back-quote",
            ));
        }
        if current.is_empty() {
            return Err(empty_segment(path));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    /// The empty path addresses the document root. Only the reader uses it.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Get all segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True only for the internal root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment
    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Last segment
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path with one more segment appended
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Path with all segments of `other` appended
    pub fn append(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Parent path, or `None` for single-segment paths
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// True if `self` equals `other` or is one of its ancestors
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// True if either path is a prefix of the other
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Canonical string form, quoting segments that are not plain identifiers
    pub fn canonical_string(&self) -> String {
        let mut result = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                result.push('.');
            }
            if is_simple_identifier(segment) {
                result.push_str(segment);
            } else {
                result.push('`');
                for ch in segment.chars() {
                    if ch == '`' || ch == '\\' {
                        result.push('\\');
                    }
                    result.push(ch);
                }
                result.push('`');
            }
        }
        result
    }
}

fn empty_segment(path: &str) -> UserDataError {
    UserDataError::invalid_path(
        path,
        "Paths must not start or end with '.' or contain '..'",
    )
}

fn is_simple_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Field names that begin and end with `__` are reserved by the backend
pub(crate) fn is_reserved_segment(segment: &str) -> bool {
    segment.starts_with("__") && segment.ends_with("__")
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::from_dot_separated(&raw).map_err(serde::de::Error::custom)
    }
}

/// A field path as the caller wrote it, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawFieldPath {
    /// Dotted notation, split on unescaped `.`
    Dotted(String),
    /// Pre-split segments, taken verbatim
    Segments(Vec<String>),
}

impl RawFieldPath {
    /// Resolve into a canonical [`FieldPath`]
    pub fn resolve(&self) -> Result<FieldPath> {
        match self {
            RawFieldPath::Dotted(path) => FieldPath::from_dot_separated(path),
            RawFieldPath::Segments(segments) => FieldPath::from_segments(segments.iter().cloned()),
        }
    }
}

impl fmt::Display for RawFieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawFieldPath::Dotted(path) => f.write_str(path),
            RawFieldPath::Segments(segments) => write!(f, "[{}]", segments.join(", ")),
        }
    }
}

impl From<&str> for RawFieldPath {
    fn from(path: &str) -> Self {
        RawFieldPath::Dotted(path.to_owned())
    }
}

impl From<String> for RawFieldPath {
    fn from(path: String) -> Self {
        RawFieldPath::Dotted(path)
    }
}

impl From<Vec<String>> for RawFieldPath {
    fn from(segments: Vec<String>) -> Self {
        RawFieldPath::Segments(segments)
    }
}

impl From<&[&str]> for RawFieldPath {
    fn from(segments: &[&str]) -> Self {
        RawFieldPath::Segments(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl From<FieldPath> for RawFieldPath {
    fn from(path: FieldPath) -> Self {
        RawFieldPath::Segments(path.segments.into_vec())
    }
}
