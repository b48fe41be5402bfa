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

//! Reader configuration

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::UserDataError;
use crate::model::DatabaseId;
use crate::reader::{PreConverter, UserDataReader};

/// Default bound on container nesting
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// How numbers that do not fit the model are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericMode {
    /// Convert to the nearest double
    #[default]
    Lenient,
    /// Reject with a numeric range error
    Strict,
}

impl std::fmt::Display for NumericMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericMode::Lenient => write!(f, "lenient"),
            NumericMode::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for NumericMode {
    type Err = UserDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(NumericMode::Lenient),
            "strict" => Ok(NumericMode::Strict),
            _ => Err(UserDataError::invalid_value(format!(
                "Invalid numeric mode: {s}"
            ))),
        }
    }
}

/// Fixed configuration of a [`UserDataReader`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum container nesting; the root is depth 0
    pub max_depth: usize,
    /// Handling of numbers that cannot be stored exactly
    pub numeric_mode: NumericMode,
    /// Truncate timestamps to microseconds, the backend's resolution
    pub truncate_timestamps: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            numeric_mode: NumericMode::Lenient,
            truncate_timestamps: true,
        }
    }
}

/// Builder for [`UserDataReader`] with fluent API
pub struct UserDataReaderBuilder {
    database_id: DatabaseId,
    pre_converter: Option<Arc<dyn PreConverter>>,
    config: ReaderConfig,
}

impl UserDataReaderBuilder {
    /// Start a builder for readers of `database_id`
    pub fn new(database_id: DatabaseId) -> Self {
        Self {
            database_id,
            pre_converter: None,
            config: ReaderConfig::default(),
        }
    }

    /// Set the database references must belong to
    pub fn with_database_id(mut self, database_id: DatabaseId) -> Self {
        self.database_id = database_id;
        self
    }

    /// Install a pre-conversion hook
    pub fn with_pre_converter(mut self, pre_converter: impl PreConverter + 'static) -> Self {
        self.pre_converter = Some(Arc::new(pre_converter));
        self
    }

    /// Set maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Enable or disable strict numeric conversion
    pub fn with_strict_numbers(mut self, enabled: bool) -> Self {
        self.config.numeric_mode = if enabled {
            NumericMode::Strict
        } else {
            NumericMode::Lenient
        };
        self
    }

    /// Enable or disable microsecond truncation of timestamps
    pub fn with_timestamp_truncation(mut self, enabled: bool) -> Self {
        self.config.truncate_timestamps = enabled;
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the reader
    pub fn build(self) -> UserDataReader {
        UserDataReader::from_parts(self.database_id, self.pre_converter, self.config)
    }
}
