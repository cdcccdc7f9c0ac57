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

//! The select node.

use flowsql_common::config::PlannerConfig;
use flowsql_common::error::{Error, Result};
use flowsql_common::name::ColumnName;
use flowsql_expr::expr::Expr;
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::FunctionRegistry;
use flowsql_expr::schema::{is_meta_or_key_name, ColumnRef, LogicalSchema};
use flowsql_physical_expr::planner::{create_physical_expr, CompiledExpression};

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};

/// One item of the select list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpression {
    pub alias: ColumnName,
    pub expr: Expr,
}

impl SelectExpression {
    pub fn new(alias: impl Into<ColumnName>, expr: Expr) -> Self {
        Self {
            alias: alias.into(),
            expr,
        }
    }
}

/// Projects the input onto an ordered list of named expressions. The key
/// columns pass through; the value columns take the output names and the
/// inferred types.
#[derive(Debug, Clone)]
pub struct ProjectNode {
    input: Box<PlanNode>,
    selects: Vec<SelectExpression>,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl ProjectNode {
    pub fn try_new(
        input: PlanNode,
        selects: Vec<SelectExpression>,
        registry: &dyn FunctionRegistry,
        config: &PlannerConfig,
        stacker: &Stacker,
    ) -> Result<Self> {
        if selects.is_empty() {
            return Err(Error::TypeMismatch(
                "the select list must not be empty".to_string(),
            ));
        }
        let mut values = Vec::with_capacity(selects.len());
        for select in &selects {
            let sql_type = expr_type(&select.expr, input.schema(), registry)?.ok_or_else(|| {
                Error::TypeMismatch(format!(
                    "cannot infer the type of select item {}",
                    select.expr
                ))
            })?;
            values.push((select.alias.clone(), sql_type));
        }
        let keys = input
            .schema()
            .key_columns()
            .iter()
            .map(|c| (c.name().clone(), c.sql_type().clone()))
            .collect();
        let schema = LogicalSchema::try_new(keys, values)?;
        let key_field = Self::propagate_key_field(&input, &selects, config).validated(&schema)?;
        Ok(Self {
            input: Box::new(input),
            selects,
            schema,
            key_field,
            context: stacker.push("Project").query_context(),
        })
    }

    /// The output key field is the output name of the select item that
    /// references the input key field, if there is one. `ROWTIME` and
    /// `ROWKEY` references never become the key field. Under the legacy
    /// semantics the key field survives only when its name is unchanged.
    fn propagate_key_field(
        input: &PlanNode,
        selects: &[SelectExpression],
        config: &PlannerConfig,
    ) -> KeyField {
        let Some(key_column) = input.key_field().resolve(input.schema()) else {
            return KeyField::none();
        };
        for select in selects {
            let Some(reference) = select.expr.as_column() else {
                continue;
            };
            let Some(resolved) = input.schema().find_value_column(reference) else {
                continue;
            };
            if resolved != key_column || is_meta_or_key_name(resolved.name()) {
                continue;
            }
            if config.legacy_key_field_semantics && &select.alias != resolved.name() {
                return KeyField::none();
            }
            return KeyField::of(ColumnRef::bare(select.alias.clone()));
        }
        KeyField::none()
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn selects(&self) -> &[SelectExpression] {
        &self.selects
    }

    /// Lower the select expressions to row-level evaluators over the input
    /// rows, one per output column.
    pub fn compile_selects(
        &self,
        registry: &dyn FunctionRegistry,
    ) -> Result<Vec<CompiledExpression>> {
        self.selects
            .iter()
            .map(|select| create_physical_expr(&select.expr, self.input.schema(), registry))
            .collect()
    }

    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
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
