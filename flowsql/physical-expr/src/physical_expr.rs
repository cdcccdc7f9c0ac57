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

//! The evaluator contract.

use flowsql_common::error::Result;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

/// A compiled row-level evaluator node.
///
/// A row is an ordered list of nullable values sized to the schema's
/// value-column count. Evaluators are deterministic and side-effect-free
/// (UDF-declared side effects excepted).
pub trait PhysicalExpr: Send + Sync + std::fmt::Debug {
    /// The inferred output type; `None` for NULL-typed expressions.
    fn data_type(&self) -> Option<SqlType>;

    /// Evaluate against one row.
    fn evaluate(&self, row: &[Value]) -> Result<Value>;
}
