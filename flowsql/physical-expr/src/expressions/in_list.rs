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

//! IN list membership.

use std::cmp::Ordering;
use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::{compare_values, Value};

use crate::physical_expr::PhysicalExpr;

#[derive(Debug)]
pub struct InListExpr {
    expr: Arc<dyn PhysicalExpr>,
    list: Vec<Arc<dyn PhysicalExpr>>,
    negated: bool,
}

impl InListExpr {
    pub fn new(
        expr: Arc<dyn PhysicalExpr>,
        list: Vec<Arc<dyn PhysicalExpr>>,
        negated: bool,
    ) -> Self {
        Self {
            expr,
            list,
            negated,
        }
    }
}

impl PhysicalExpr for InListExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(SqlType::Boolean)
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let needle = self.expr.evaluate(row)?;
        // a NULL needle matches nothing
        let mut matched = false;
        if !needle.is_null() {
            for item in &self.list {
                let item = item.evaluate(row)?;
                if compare_values(&needle, &item) == Some(Ordering::Equal) {
                    matched = true;
                    break;
                }
            }
        }
        Ok(Value::Boolean(matched != self.negated))
    }
}
