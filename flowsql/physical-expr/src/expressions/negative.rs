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

//! Arithmetic unary minus.

use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

#[derive(Debug)]
pub struct NegativeExpr {
    operand: Arc<dyn PhysicalExpr>,
}

impl NegativeExpr {
    pub fn new(operand: Arc<dyn PhysicalExpr>) -> Self {
        Self { operand }
    }
}

impl PhysicalExpr for NegativeExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.operand.data_type()
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        Ok(match self.operand.evaluate(row)? {
            Value::Null => Value::Null,
            Value::Integer(i) => Value::Integer(i.checked_neg().ok_or_else(|| {
                Error::Evaluation(format!("integer overflow negating {i}"))
            })?),
            Value::Bigint(i) => Value::Bigint(i.checked_neg().ok_or_else(|| {
                Error::Evaluation(format!("integer overflow negating {i}"))
            })?),
            Value::Double(d) => Value::Double(-d),
            Value::Decimal(d) => Value::Decimal(-d),
            other => {
                return Err(Error::Evaluation(format!(
                    "cannot negate non-numeric value {other}"
                )))
            }
        })
    }
}
