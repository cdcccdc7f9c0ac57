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

//! CASE evaluation.

use std::cmp::Ordering;
use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::{compare_values, Value};

use crate::physical_expr::PhysicalExpr;

/// Searched (`operand` absent) or simple CASE. Branches are evaluated
/// lazily, first match wins, no match yields the ELSE value or NULL.
#[derive(Debug)]
pub struct CaseExpr {
    operand: Option<Arc<dyn PhysicalExpr>>,
    when_then: Vec<(Arc<dyn PhysicalExpr>, Arc<dyn PhysicalExpr>)>,
    else_expr: Option<Arc<dyn PhysicalExpr>>,
    data_type: Option<SqlType>,
}

impl CaseExpr {
    pub fn new(
        operand: Option<Arc<dyn PhysicalExpr>>,
        when_then: Vec<(Arc<dyn PhysicalExpr>, Arc<dyn PhysicalExpr>)>,
        else_expr: Option<Arc<dyn PhysicalExpr>>,
        data_type: Option<SqlType>,
    ) -> Self {
        Self {
            operand,
            when_then,
            else_expr,
            data_type,
        }
    }
}

impl PhysicalExpr for CaseExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.data_type.clone()
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let operand = self
            .operand
            .as_ref()
            .map(|o| o.evaluate(row))
            .transpose()?;
        for (when, then) in &self.when_then {
            let when = when.evaluate(row)?;
            let hit = match &operand {
                // simple CASE: compare the operand against the WHEN value
                Some(operand) => {
                    compare_values(operand, &when) == Some(Ordering::Equal)
                }
                // searched CASE: the WHEN is a predicate
                None => matches!(when, Value::Boolean(true)),
            };
            if hit {
                return then.evaluate(row);
            }
        }
        match &self.else_expr {
            Some(else_expr) => else_expr.evaluate(row),
            None => Ok(Value::Null),
        }
    }
}
