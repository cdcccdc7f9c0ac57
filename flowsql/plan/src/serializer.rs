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

//! The serializer collaborator contract.
//!
//! The planner hands the collaborator a schema and the declared formats and
//! receives an opaque byte producer; it is consumed only at sink and
//! insert-values time. No wire format is defined here.

use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::schema::LogicalSchema;
use flowsql_expr::value::Value;

use crate::catalog::Format;

/// Serializes key and value rows of one schema.
pub trait RowSerde: Send + Sync {
    fn serialize_key(&self, key: &[Value]) -> Result<Vec<u8>>;
    fn serialize_value(&self, row: &[Value]) -> Result<Vec<u8>>;
}

/// Creates [`RowSerde`] instances for a schema/format combination.
pub trait SerializerFactory {
    fn create(
        &self,
        schema: &LogicalSchema,
        key_format: Format,
        value_format: Format,
    ) -> Result<Arc<dyn RowSerde>>;
}
