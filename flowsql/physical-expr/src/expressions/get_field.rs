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

//! Struct field access.

use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

/// `base->field`. The field's existence was checked at inference time; a
/// NULL base yields NULL.
#[derive(Debug)]
pub struct GetFieldExpr {
    base: Arc<dyn PhysicalExpr>,
    field: String,
    data_type: Option<SqlType>,
}

impl GetFieldExpr {
    pub fn new(
        base: Arc<dyn PhysicalExpr>,
        field: String,
        data_type: Option<SqlType>,
    ) -> Self {
        Self {
            base,
            field,
            data_type,
        }
    }
}

impl PhysicalExpr for GetFieldExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.data_type.clone()
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        match self.base.evaluate(row)? {
            Value::Null => Ok(Value::Null),
            Value::Struct(fields) => Ok(fields
                .iter()
                .find(|(name, _)| name == &self.field)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)),
            other => Err(Error::Evaluation(format!(
                "cannot dereference field {} of non-struct value {other}",
                self.field
            ))),
        }
    }
}
