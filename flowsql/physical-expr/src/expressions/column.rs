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

//! A column slot of the input row.

use flowsql_common::error::Result;
use flowsql_common::internal_err;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

/// Reads one positional slot of the row.
#[derive(Debug, Clone)]
pub struct ColumnExpr {
    full_name: String,
    index: usize,
    data_type: SqlType,
}

impl ColumnExpr {
    pub fn new(full_name: String, index: usize, data_type: SqlType) -> Self {
        Self {
            full_name,
            index,
            data_type,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl PhysicalExpr for ColumnExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(self.data_type.clone())
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        match row.get(self.index) {
            Some(value) => Ok(value.clone()),
            None => internal_err!(
                "row has {} columns, column {} expects index {}",
                row.len(),
                self.full_name,
                self.index
            ),
        }
    }
}
