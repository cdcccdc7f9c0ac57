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

//! Scalar function call sites.
//!
//! Every call site resolves to its own function instance at planning time,
//! even when the same function appears several times in one expression, and
//! carries a stable per-site identifier assigned in planning order.

use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::registry::ScalarFunction;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

/// A resolved scalar function call.
#[derive(Debug)]
pub struct ScalarFunctionExpr {
    site_id: String,
    function: ScalarFunction,
    args: Vec<Arc<dyn PhysicalExpr>>,
}

impl ScalarFunctionExpr {
    pub fn new(
        site_id: String,
        function: ScalarFunction,
        args: Vec<Arc<dyn PhysicalExpr>>,
    ) -> Self {
        Self {
            site_id,
            function,
            args,
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }
}

impl PhysicalExpr for ScalarFunctionExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(self.function.return_type.clone())
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.evaluate(row))
            .collect::<Result<Vec<_>>>()?;
        (self.function.fun)(&args)
    }
}
