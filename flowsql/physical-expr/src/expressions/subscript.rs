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

//! Array element and map value access.

use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

/// `base[index]`. A missing element or key yields NULL; a negative array
/// index counts from the end.
#[derive(Debug)]
pub struct SubscriptExpr {
    base: Arc<dyn PhysicalExpr>,
    index: Arc<dyn PhysicalExpr>,
    data_type: Option<SqlType>,
}

impl SubscriptExpr {
    pub fn new(
        base: Arc<dyn PhysicalExpr>,
        index: Arc<dyn PhysicalExpr>,
        data_type: Option<SqlType>,
    ) -> Self {
        Self {
            base,
            index,
            data_type,
        }
    }
}

impl PhysicalExpr for SubscriptExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.data_type.clone()
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let base = self.base.evaluate(row)?;
        let index = self.index.evaluate(row)?;
        match (base, index) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Array(items), Value::Integer(i)) => {
                let len = items.len() as i64;
                let position = if (i as i64) < 0 { len + i as i64 } else { i as i64 };
                if position < 0 || position >= len {
                    return Ok(Value::Null);
                }
                Ok(items[position as usize].clone())
            }
            (Value::Map(entries), Value::String(key)) => Ok(entries
                .iter()
                .find(|(k, _)| k == &key)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)),
            (base, index) => Err(Error::Evaluation(format!(
                "cannot subscript {base} with {index}"
            ))),
        }
    }
}
