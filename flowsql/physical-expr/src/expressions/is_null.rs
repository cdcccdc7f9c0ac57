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

//! IS NULL / IS NOT NULL.

use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

#[derive(Debug)]
pub struct IsNullExpr {
    operand: Arc<dyn PhysicalExpr>,
    negated: bool,
}

impl IsNullExpr {
    pub fn new(operand: Arc<dyn PhysicalExpr>, negated: bool) -> Self {
        Self { operand, negated }
    }
}

impl PhysicalExpr for IsNullExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(SqlType::Boolean)
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let is_null = self.operand.evaluate(row)?.is_null();
        Ok(Value::Boolean(is_null != self.negated))
    }
}
