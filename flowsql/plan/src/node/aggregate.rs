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

//! Aggregation nodes.
//!
//! An aggregate consumes a grouped input and produces a TABLE whose value
//! columns are the grouping columns followed by one column per aggregation.
//! The node exposes the runtime pieces: per-aggregation initializers and
//! accumulators, the session merger, and the result mapper that prepends the
//! group-key columns. A windowed aggregate additionally carries the window
//! and the selector that fills the `WINDOWSTART`/`WINDOWEND` slots.

use flowsql_common::config::PlannerConfig;
use flowsql_common::error::{Error, Result};
use flowsql_common::internal_err;
use flowsql_common::name::ColumnName;
use flowsql_expr::expr::FunctionCall;
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::{is_window_bound, AggregateFunction, FunctionRegistry};
use flowsql_expr::schema::LogicalSchema;
use flowsql_expr::value::Value;

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};
use crate::window::{WindowExpression, WindowSelector};

/// One aggregation of the select list, resolved against the registry.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub alias: ColumnName,
    pub call: FunctionCall,
    pub function: AggregateFunction,
}

/// Validate the schema-arity contract and resolve the aggregations.
fn resolve_aggregations(
    input: &PlanNode,
    non_aggregate_columns: usize,
    aggregations: Vec<(ColumnName, FunctionCall)>,
    output_schema: &LogicalSchema,
    registry: &dyn FunctionRegistry,
    windowed: bool,
) -> Result<Vec<Aggregation>> {
    let expected = non_aggregate_columns + aggregations.len();
    let actual = output_schema.value_columns().len();
    if expected != actual {
        return Err(Error::SchemaArityMismatch { expected, actual });
    }
    if !matches!(input, PlanNode::GroupBy(_)) {
        return internal_err!("aggregation requires a grouped input");
    }
    aggregations
        .into_iter()
        .map(|(alias, call)| {
            if !windowed && is_window_bound(&call.name) {
                return Err(Error::WindowBoundsWithoutWindow(call.name.to_string()));
            }
            if call.args.len() > 1 {
                return Err(Error::FunctionArityMismatch {
                    name: call.name.to_string(),
                    expected: 1,
                    actual: call.args.len(),
                });
            }
            let arg = match call.args.first() {
                Some(arg) => expr_type(arg, input.schema(), registry)?,
                None => None,
            };
            let function = registry.aggregate_function(&call.name, arg.as_ref())?;
            Ok(Aggregation {
                alias,
                call,
                function,
            })
        })
        .collect()
}

fn map_result(
    non_aggregate_columns: usize,
    aggregations: &[Aggregation],
    group_columns: Vec<Value>,
    aggregate_row: Vec<Value>,
) -> Result<Vec<Value>> {
    if group_columns.len() != non_aggregate_columns {
        return internal_err!(
            "expected {} group-key column(s), got {}",
            non_aggregate_columns,
            group_columns.len()
        );
    }
    if aggregate_row.len() != aggregations.len() {
        return internal_err!(
            "expected {} aggregate value(s), got {}",
            aggregations.len(),
            aggregate_row.len()
        );
    }
    let mut row = group_columns;
    row.extend(aggregate_row);
    Ok(row)
}

/// A non-windowed aggregation.
#[derive(Debug, Clone)]
pub struct AggregateNode {
    input: Box<PlanNode>,
    non_aggregate_columns: usize,
    aggregations: Vec<Aggregation>,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl AggregateNode {
    pub fn try_new(
        input: PlanNode,
        non_aggregate_columns: usize,
        aggregations: Vec<(ColumnName, FunctionCall)>,
        output_schema: LogicalSchema,
        registry: &dyn FunctionRegistry,
        stacker: &Stacker,
    ) -> Result<Self> {
        let aggregations = resolve_aggregations(
            &input,
            non_aggregate_columns,
            aggregations,
            &output_schema,
            registry,
            false,
        )?;
        let key_field = input.key_field().retained_in(&output_schema);
        Ok(Self {
            input: Box::new(input),
            non_aggregate_columns,
            aggregations,
            schema: output_schema,
            key_field,
            context: stacker.push("Aggregate").query_context(),
        })
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn non_aggregate_columns(&self) -> usize {
        self.non_aggregate_columns
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    /// The initial accumulator row, one slot per aggregation.
    pub fn initializers(&self) -> Vec<Value> {
        self.aggregations
            .iter()
            .map(|a| a.function.initial_value.clone())
            .collect()
    }

    /// Prepend the group-key columns to an aggregate output row.
    pub fn map_result(
        &self,
        group_columns: Vec<Value>,
        aggregate_row: Vec<Value>,
    ) -> Result<Vec<Value>> {
        map_result(
            self.non_aggregate_columns,
            &self.aggregations,
            group_columns,
            aggregate_row,
        )
    }

    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
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

/// A windowed aggregation.
#[derive(Debug, Clone)]
pub struct WindowedAggregateNode {
    input: Box<PlanNode>,
    non_aggregate_columns: usize,
    aggregations: Vec<Aggregation>,
    window: WindowExpression,
    selector: WindowSelector,
    legacy_session_key: bool,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl WindowedAggregateNode {
    pub fn try_new(
        input: PlanNode,
        non_aggregate_columns: usize,
        aggregations: Vec<(ColumnName, FunctionCall)>,
        window: WindowExpression,
        output_schema: LogicalSchema,
        registry: &dyn FunctionRegistry,
        config: &PlannerConfig,
        stacker: &Stacker,
    ) -> Result<Self> {
        let aggregations = resolve_aggregations(
            &input,
            non_aggregate_columns,
            aggregations,
            &output_schema,
            registry,
            true,
        )?;
        let mut start_slots = Vec::new();
        let mut end_slots = Vec::new();
        for (i, aggregation) in aggregations.iter().enumerate() {
            let slot = non_aggregate_columns + i;
            match aggregation.call.name.as_str() {
                flowsql_expr::registry::WINDOW_START_NAME => start_slots.push(slot),
                flowsql_expr::registry::WINDOW_END_NAME => end_slots.push(slot),
                _ => {}
            }
        }
        let legacy_session_key = window.requires_merger() && config.windowed_session_key_legacy;
        let key_field = input.key_field().retained_in(&output_schema);
        Ok(Self {
            input: Box::new(input),
            non_aggregate_columns,
            aggregations,
            window,
            selector: WindowSelector::new(start_slots, end_slots),
            legacy_session_key,
            schema: output_schema,
            key_field,
            context: stacker.push("WindowedAggregate").query_context(),
        })
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn non_aggregate_columns(&self) -> usize {
        self.non_aggregate_columns
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    pub fn window(&self) -> &WindowExpression {
        &self.window
    }

    /// The post-aggregation selector for the window-bound pseudo-aggregates.
    pub fn window_selector(&self) -> &WindowSelector {
        &self.selector
    }

    /// Whether session-window keys use the pre-rework serialization.
    pub fn legacy_session_key(&self) -> bool {
        self.legacy_session_key
    }

    pub fn initializers(&self) -> Vec<Value> {
        self.aggregations
            .iter()
            .map(|a| a.function.initial_value.clone())
            .collect()
    }

    /// Merge two accumulator rows; only meaningful for session windows.
    pub fn merge(&self, mut acc: Vec<Value>, other: &[Value]) -> Result<Vec<Value>> {
        if !self.window.requires_merger() {
            return internal_err!("{:?} windows do not merge", self.window.window_type());
        }
        if acc.len() != self.aggregations.len() || other.len() != self.aggregations.len() {
            return internal_err!("accumulator arity mismatch in session merge");
        }
        for (i, aggregation) in self.aggregations.iter().enumerate() {
            let merged = (aggregation.function.merge)(acc[i].clone(), &other[i]);
            acc[i] = merged;
        }
        Ok(acc)
    }

    pub fn map_result(
        &self,
        group_columns: Vec<Value>,
        aggregate_row: Vec<Value>,
    ) -> Result<Vec<Value>> {
        map_result(
            self.non_aggregate_columns,
            &self.aggregations,
            group_columns,
            aggregate_row,
        )
    }

    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
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
