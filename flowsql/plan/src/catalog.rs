// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The read-only catalog collaborator.
//!
//! The catalog supplies everything the planner needs to know about a named
//! stream or table; the planner never mutates it.

use flowsql_common::name::{ColumnName, SourceName};
use flowsql_expr::schema::LogicalSchema;
use indexmap::IndexMap;

use crate::key_field::KeyField;

/// Whether a source is an append-only stream or a changelog-backed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Stream,
    Table,
}

/// Serialization format of keys or values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Avro,
    Delimited,
}

/// The window kind a windowed source was materialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Tumbling,
    Hopping,
    Session,
}

/// How a record's timestamp is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// The substrate's record timestamp.
    #[default]
    RecordTime,
    /// A BIGINT column carrying epoch milliseconds.
    Column(ColumnName),
    /// A STRING column parsed with the given date-time pattern.
    StringColumn(ColumnName, String),
}

/// Source-level serde switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerdeOptions {
    /// Serialize single-column values without a wrapping record.
    pub unwrap_single_values: bool,
}

/// One catalog entry: a named stream or table bound to a topic.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub name: SourceName,
    pub source_type: SourceType,
    /// The declared schema, unaliased.
    pub schema: LogicalSchema,
    /// The declared key column, if one was declared.
    pub key_field: KeyField,
    pub key_format: Format,
    pub value_format: Format,
    pub timestamp_policy: TimestampPolicy,
    pub topic_name: String,
    pub serde_options: SerdeOptions,
    pub partition_count: u32,
    /// Present when the source is windowed (the key carries window bounds).
    pub window_type: Option<WindowType>,
}

impl CatalogSource {
    pub fn new(
        name: impl Into<SourceName>,
        source_type: SourceType,
        schema: LogicalSchema,
        topic_name: impl Into<String>,
        partition_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            source_type,
            schema,
            key_field: KeyField::none(),
            key_format: Format::Json,
            value_format: Format::Json,
            timestamp_policy: TimestampPolicy::RecordTime,
            topic_name: topic_name.into(),
            serde_options: SerdeOptions::default(),
            partition_count,
            window_type: None,
        }
    }

    pub fn with_key_field(mut self, key_field: KeyField) -> Self {
        self.key_field = key_field;
        self
    }

    pub fn with_formats(mut self, key_format: Format, value_format: Format) -> Self {
        self.key_format = key_format;
        self.value_format = value_format;
        self
    }

    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    pub fn with_window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = Some(window_type);
        self
    }
}

/// Read-only lookup of sources by name.
pub trait Catalog {
    fn get_source(&self, name: &SourceName) -> Option<&CatalogSource>;
}

/// An insertion-ordered in-memory catalog, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    sources: IndexMap<SourceName, CatalogSource>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: CatalogSource) {
        self.sources.insert(source.name.clone(), source);
    }
}

impl Catalog for MemoryCatalog {
    fn get_source(&self, name: &SourceName) -> Option<&CatalogSource> {
        self.sources.get(name)
    }
}
