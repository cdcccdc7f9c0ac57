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

//! The group-by node and the rekey rule.

use flowsql_common::config::PlannerConfig;
use flowsql_common::error::{Error, Result};
use flowsql_common::name::ColumnName;
use flowsql_expr::expr::Expr;
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::FunctionRegistry;
use flowsql_expr::schema::{LogicalSchema, ROWKEY_NAME};
use itertools::Itertools;

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};

/// Separator joining the textual forms of the grouping expressions into the
/// synthetic grouped key name.
pub const GROUP_BY_SEPARATOR: &str = "|+|";

/// Whether grouping `input` by `exprs` needs a repartition step.
///
/// No repartition is required iff the grouping is a single column reference
/// that is already the key: either the current key field or `ROWKEY` itself.
/// Under the legacy key-field semantics, `GROUP BY ROWKEY` repartitions
/// anyway.
pub fn rekey_required(input: &PlanNode, exprs: &[Expr], config: &PlannerConfig) -> bool {
    let [expr] = exprs else {
        return true;
    };
    let Some(reference) = expr.as_column() else {
        return true;
    };
    let Some(column) = input.schema().find_value_column(reference) else {
        return true;
    };
    if column.name().as_str() == ROWKEY_NAME {
        return config.legacy_key_field_semantics;
    }
    match input.key_field().resolve(input.schema()) {
        Some(key_column) => key_column != column,
        None => true,
    }
}

/// The synthetic key name of a rekeyed grouping: the grouping expressions'
/// textual forms joined with [`GROUP_BY_SEPARATOR`].
pub fn grouped_key_name(exprs: &[Expr]) -> ColumnName {
    ColumnName::new(exprs.iter().map(|e| e.to_string()).join(GROUP_BY_SEPARATOR))
}

/// Groups the input by an ordered list of expressions. The grouped result is
/// a TABLE; the schema is unchanged (the aggregate gives it its final
/// shape).
#[derive(Debug, Clone)]
pub struct GroupByNode {
    input: Box<PlanNode>,
    group_expressions: Vec<Expr>,
    key_field: KeyField,
    context: QueryContext,
}

impl GroupByNode {
    pub fn try_new(
        input: PlanNode,
        group_expressions: Vec<Expr>,
        key_field: KeyField,
        registry: &dyn FunctionRegistry,
        stacker: &Stacker,
    ) -> Result<Self> {
        if group_expressions.is_empty() {
            return Err(Error::TypeMismatch(
                "GROUP BY requires at least one grouping expression".to_string(),
            ));
        }
        for expr in &group_expressions {
            expr_type(expr, input.schema(), registry)?;
        }
        let key_field = key_field.validated(input.schema())?;
        Ok(Self {
            input: Box::new(input),
            group_expressions,
            key_field,
            context: stacker.push("GroupBy").query_context(),
        })
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn group_expressions(&self) -> &[Expr] {
        &self.group_expressions
    }

    pub fn schema(&self) -> &LogicalSchema {
        self.input.schema()
    }

    pub fn key_field(&self) -> &KeyField {
        &self.key_field
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Table
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.context
    }
}
