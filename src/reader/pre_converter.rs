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

//! Pre-conversion hook

use crate::model::RawValue;

/// Normalizes host-specific values before the reader interprets them
///
/// The hook runs once on every non-container node. It must be pure and
/// idempotent; returning the input unchanged is a no-op. Typical hooks turn
/// [`RawValue::Opaque`] host objects into one of the recognized kinds.
pub trait PreConverter: Send + Sync {
    /// Convert one node
    fn convert(&self, value: RawValue) -> RawValue;
}

impl<F> PreConverter for F
where
    F: Fn(RawValue) -> RawValue + Send + Sync,
{
    fn convert(&self, value: RawValue) -> RawValue {
        self(value)
    }
}
