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

//! Field value sentinels
//!
//! Sentinels stand in for a transform the backend evaluates (delete, server
//! timestamp, increment, array union/remove) instead of a literal value. They
//! can appear anywhere a value can appear in the caller's input; the reader
//! decides whether the position is legal.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::raw::RawValue;

/// Marker values that request a transform instead of a literal write
#[derive(Debug, Clone, PartialEq)]
pub enum Sentinel {
    /// Remove the field
    Delete,
    /// Replace with the commit time on the server
    ServerTimestamp,
    /// Append the elements not already present
    ArrayUnion(Vec<RawValue>),
    /// Remove every instance of the elements
    ArrayRemove(Vec<RawValue>),
    /// Add the operand to the current numeric value
    Increment(Box<RawValue>),
}

impl Sentinel {
    /// `FieldValue.delete()`
    pub fn delete() -> Self {
        Sentinel::Delete
    }

    /// `FieldValue.serverTimestamp()`
    pub fn server_timestamp() -> Self {
        Sentinel::ServerTimestamp
    }

    /// `FieldValue.arrayUnion(elements)`
    pub fn array_union<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        Sentinel::ArrayUnion(elements.into_iter().map(Into::into).collect())
    }

    /// `FieldValue.arrayRemove(elements)`
    pub fn array_remove<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        Sentinel::ArrayRemove(elements.into_iter().map(Into::into).collect())
    }

    /// `FieldValue.increment(operand)`
    pub fn increment(operand: impl Into<RawValue>) -> Self {
        Sentinel::Increment(Box::new(operand.into()))
    }

    /// The kind of this sentinel, without its operand
    pub fn kind(&self) -> SentinelKind {
        match self {
            Sentinel::Delete => SentinelKind::Delete,
            Sentinel::ServerTimestamp => SentinelKind::ServerTimestamp,
            Sentinel::ArrayUnion(_) => SentinelKind::ArrayUnion,
            Sentinel::ArrayRemove(_) => SentinelKind::ArrayRemove,
            Sentinel::Increment(_) => SentinelKind::Increment,
        }
    }
}

/// Closed set of sentinel kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentinelKind {
    Delete,
    ServerTimestamp,
    ArrayUnion,
    ArrayRemove,
    Increment,
}

impl SentinelKind {
    /// The SDK method that creates this sentinel, used in error messages
    pub fn method_name(&self) -> &'static str {
        match self {
            SentinelKind::Delete => "FieldValue.delete()",
            SentinelKind::ServerTimestamp => "FieldValue.serverTimestamp()",
            SentinelKind::ArrayUnion => "FieldValue.arrayUnion()",
            SentinelKind::ArrayRemove => "FieldValue.arrayRemove()",
            SentinelKind::Increment => "FieldValue.increment()",
        }
    }
}

impl fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}
