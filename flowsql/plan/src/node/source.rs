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

//! The leaf node reading a catalog source.

use flowsql_common::error::Result;
use flowsql_common::name::SourceName;
use flowsql_expr::schema::LogicalSchema;

use crate::catalog::{CatalogSource, SourceType};
use crate::key_field::KeyField;
use crate::node::NodeType;
use crate::query_context::{QueryContext, Stacker};

/// Reads a stream or table from its topic. The output schema is the catalog
/// schema aliased by the declared source alias, with `ROWTIME` and `ROWKEY`
/// projected into the value columns; the output key field is the catalog's
/// declared key column, if any.
#[derive(Debug, Clone)]
pub struct SourceNode {
    source: CatalogSource,
    alias: SourceName,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl SourceNode {
    pub fn try_new(
        source: CatalogSource,
        alias: SourceName,
        stacker: &Stacker,
    ) -> Result<Self> {
        let schema = source
            .schema
            .with_alias(&alias)?
            .with_meta_and_key_cols_in_value();
        let key_field = source.key_field.clone().validated(&schema)?;
        Ok(Self {
            source,
            alias,
            schema,
            key_field,
            context: stacker.push("Source").query_context(),
        })
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn alias(&self) -> &SourceName {
        &self.alias
    }

    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
    }

    pub fn key_field(&self) -> &KeyField {
        &self.key_field
    }

    pub fn node_type(&self) -> NodeType {
        match self.source.source_type {
            SourceType::Stream => NodeType::Stream,
            SourceType::Table => NodeType::Table,
        }
    }

    pub fn partition_count(&self) -> u32 {
        self.source.partition_count
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.context
    }
}
