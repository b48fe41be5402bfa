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

//! User data reader
//!
//! Converts caller-supplied values into the document model. Each entry point
//! walks its input depth-first, building plain values, collecting sentinel
//! transforms and deriving the field mask for partial writes.

mod assembler;
mod context;
mod mask_builder;
mod pre_converter;
mod sentinel;
mod value_parser;

pub use assembler::{ParsedSetData, ParsedUpdateData};
pub use context::DataSource;
pub use pre_converter::PreConverter;

use std::sync::Arc;

use crate::config::{ReaderConfig, UserDataReaderBuilder};
use crate::model::DatabaseId;

/// Converts user data for one database
///
/// The reader holds only immutable state and can be shared across threads;
/// every call allocates its own parse state.
#[derive(Clone)]
pub struct UserDataReader {
    database_id: DatabaseId,
    pre_converter: Option<Arc<dyn PreConverter>>,
    config: ReaderConfig,
}

impl UserDataReader {
    /// Create a reader with a pre-conversion hook and default configuration
    pub fn new(database_id: DatabaseId, pre_converter: impl PreConverter + 'static) -> Self {
        Self::from_parts(database_id, Some(Arc::new(pre_converter)), ReaderConfig::default())
    }

    /// Start a builder for readers of `database_id`
    pub fn builder(database_id: DatabaseId) -> UserDataReaderBuilder {
        UserDataReaderBuilder::new(database_id)
    }

    /// Copy of this reader with another configuration
    pub fn with_config(&self, config: ReaderConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub(crate) fn from_parts(
        database_id: DatabaseId,
        pre_converter: Option<Arc<dyn PreConverter>>,
        config: ReaderConfig,
    ) -> Self {
        log::debug!(
            "Creating user data reader for {database_id} (max depth {}, {} numbers)",
            config.max_depth,
            config.numeric_mode
        );
        Self {
            database_id,
            pre_converter,
            config,
        }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

impl std::fmt::Debug for UserDataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDataReader")
            .field("database_id", &self.database_id)
            .field("pre_converter", &self.pre_converter.is_some())
            .field("config", &self.config)
            .finish()
    }
}
