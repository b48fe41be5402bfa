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

//! Field masks for partial writes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::field_path::FieldPath;

/// Set of field paths a merge or update writes
///
/// Paths are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMask {
    paths: BTreeSet<FieldPath>,
}

impl FieldMask {
    /// Build a mask, dropping duplicates
    pub fn new<I: IntoIterator<Item = FieldPath>>(paths: I) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Build a mask and drop every path already covered by another entry
    pub fn coalesced<I: IntoIterator<Item = FieldPath>>(paths: I) -> Self {
        let sorted: BTreeSet<FieldPath> = paths.into_iter().collect();
        let mut kept: BTreeSet<FieldPath> = BTreeSet::new();
        // Sorted order visits every parent before its children.
        for path in sorted {
            if !kept.iter().any(|parent| parent.is_prefix_of(&path)) {
                kept.insert(path);
            }
        }
        Self { paths: kept }
    }

    /// True if some entry equals `path` or is one of its ancestors
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.paths.iter().any(|entry| entry.is_prefix_of(path))
    }

    /// Check for an exact entry
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate entries in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }
}

impl IntoIterator for FieldMask {
    type Item = FieldPath;
    type IntoIter = std::collections::btree_set::IntoIter<FieldPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::from_dot_separated(s).unwrap()
    }

    #[test]
    fn test_deduplicates() {
        let mask = FieldMask::new([path("a"), path("b"), path("a")]);
        assert_eq!(mask.len(), 2);
    }

    #[test]
    fn test_coalesced_drops_children() {
        let mask = FieldMask::coalesced([path("a.b.c"), path("a.b"), path("ab"), path("a.bc")]);
        let rendered: Vec<String> = mask.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a.b", "a.bc", "ab"]);
    }

    #[test]
    fn test_covers() {
        let mask = FieldMask::new([path("a.b")]);
        assert!(mask.covers(&path("a.b")));
        assert!(mask.covers(&path("a.b.c")));
        assert!(!mask.covers(&path("a")));
        assert!(!mask.covers(&path("a.bc")));
    }
}
