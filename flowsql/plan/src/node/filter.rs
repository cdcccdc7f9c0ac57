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

//! The filter node.

use flowsql_common::error::{Error, Result};
use flowsql_expr::expr::Expr;
use flowsql_expr::expr_rewriter::rowtime::normalize_rowtime;
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::FunctionRegistry;
use flowsql_expr::schema::LogicalSchema;
use flowsql_expr::types::SqlType;
use flowsql_physical_expr::planner::{create_physical_expr, CompiledExpression};

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};

/// Filters rows on a BOOLEAN predicate. Date-time string literals compared
/// against `ROWTIME` are normalized to epoch milliseconds at construction.
/// Schema and key field pass through unchanged.
#[derive(Debug, Clone)]
pub struct FilterNode {
    input: Box<PlanNode>,
    predicate: Expr,
    key_field: KeyField,
    context: QueryContext,
}

impl FilterNode {
    pub fn try_new(
        input: PlanNode,
        predicate: Expr,
        registry: &dyn FunctionRegistry,
        stacker: &Stacker,
    ) -> Result<Self> {
        let predicate = normalize_rowtime(predicate)?;
        match expr_type(&predicate, input.schema(), registry)? {
            Some(SqlType::Boolean) | None => {}
            Some(other) => {
                return Err(Error::TypeMismatch(format!(
                    "filter predicate must be BOOLEAN, got {other}"
                )))
            }
        }
        let key_field = input.key_field().clone();
        Ok(Self {
            input: Box::new(input),
            predicate,
            key_field,
            context: stacker.push("Filter").query_context(),
        })
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }

    /// Lower the predicate to a row-level evaluator over the input rows.
    pub fn compile_predicate(
        &self,
        registry: &dyn FunctionRegistry,
    ) -> Result<CompiledExpression> {
        create_physical_expr(&self.predicate, self.input.schema(), registry)
    }

    pub fn schema(&self) -> &LogicalSchema {
        self.input.schema()
    }

    pub fn key_field(&self) -> &KeyField {
        &self.key_field
    }

    pub fn node_type(&self) -> NodeType {
        self.input.node_type()
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.context
    }
}
