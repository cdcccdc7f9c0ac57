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

//! A constant value.

use flowsql_common::error::Result;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    value: Value,
}

impl LiteralExpr {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl PhysicalExpr for LiteralExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.value.sql_type()
    }

    fn evaluate(&self, _row: &[Value]) -> Result<Value> {
        Ok(self.value.clone())
    }
}
