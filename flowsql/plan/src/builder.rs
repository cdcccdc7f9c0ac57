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

//! Fluent construction of plan trees.
//!
//! The builder owns the growing tree and enforces the construction rules of
//! each node: select naming, the group-by rekey rule, joiner selection and
//! partition-by no-ops. Planning is deterministic: the same inputs produce
//! an equal tree, generated names included.

use flowsql_common::config::PlannerConfig;
use flowsql_common::error::{Error, Result};
use flowsql_common::internal_err;
use flowsql_common::name::{ColumnName, SourceName};
use flowsql_expr::expr::{Expr, FunctionCall};
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::FunctionRegistry;
use flowsql_expr::schema::{ColumnRef, LogicalSchema, ROWKEY_NAME};
use flowsql_expr::types::SqlType;
use log::debug;

use crate::catalog::{Catalog, Format};
use crate::key_field::KeyField;
use crate::node::join::plan_join;
use crate::node::{
    grouped_key_name, rekey_required, AggregateNode, FilterNode, GroupByNode, JoinKey, JoinType,
    PlanNode, ProjectNode, RepartitionNode, SelectExpression, SinkNode, SourceNode,
    WindowedAggregateNode,
};
use crate::query_context::{generated_alias, Stacker};
use crate::window::{WindowExpression, WithinExpression};

/// Builds a plan tree bottom-up.
pub struct PlanBuilder<'a> {
    node: PlanNode,
    registry: &'a dyn FunctionRegistry,
    config: PlannerConfig,
    stacker: Stacker,
}

impl<'a> PlanBuilder<'a> {
    /// Start from a catalog source, aliased by `alias` (the source's own
    /// name when absent).
    pub fn from_catalog(
        catalog: &dyn Catalog,
        source: impl Into<SourceName>,
        alias: Option<SourceName>,
        registry: &'a dyn FunctionRegistry,
        config: PlannerConfig,
    ) -> Result<Self> {
        Self::from_catalog_with_stacker(catalog, source, alias, registry, config, Stacker::new())
    }

    /// Same, naming nodes under a caller-supplied stacker context.
    pub fn from_catalog_with_stacker(
        catalog: &dyn Catalog,
        source: impl Into<SourceName>,
        alias: Option<SourceName>,
        registry: &'a dyn FunctionRegistry,
        config: PlannerConfig,
        stacker: Stacker,
    ) -> Result<Self> {
        let source = source.into();
        let entry = catalog
            .get_source(&source)
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?
            .clone();
        let alias = alias.unwrap_or_else(|| source.clone());
        debug!("planning over source {source} as {alias}");
        let node = SourceNode::try_new(entry, alias, &stacker)?;
        Ok(Self {
            node: PlanNode::Source(node),
            registry,
            config,
            stacker,
        })
    }

    /// Project onto `(alias, expression)` pairs. A missing alias defaults to
    /// the referenced column or struct field name, or to the generated
    /// `FSQL_COL_{i}` alias for other expressions.
    pub fn project(self, selects: Vec<(Option<ColumnName>, Expr)>) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let selects = selects
            .into_iter()
            .enumerate()
            .map(|(i, (alias, expr))| {
                let alias = alias.unwrap_or_else(|| default_alias(&expr, i));
                SelectExpression::new(alias, expr)
            })
            .collect();
        let node = ProjectNode::try_new(node, selects, registry, &config, &stacker)?;
        Ok(Self {
            node: PlanNode::Project(node),
            registry,
            config,
            stacker,
        })
    }

    /// Filter on a BOOLEAN predicate.
    pub fn filter(self, predicate: Expr) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let node = FilterNode::try_new(node, predicate, registry, &stacker)?;
        Ok(Self {
            node: PlanNode::Filter(node),
            registry,
            config,
            stacker,
        })
    }

    /// Group by the given expressions, inserting a repartition step when the
    /// grouping is not already the key.
    pub fn group_by(self, exprs: Vec<Expr>) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let rekey = rekey_required(&node, &exprs, &config);
        let (input, key_field) = if rekey {
            debug!(
                "group-by on {} requires a repartition",
                grouped_key_name(&exprs)
            );
            let repartition =
                RepartitionNode::try_new(node, exprs.clone(), registry, &stacker)?;
            let key_field = repartition.key_field().clone();
            (PlanNode::Repartition(repartition), key_field)
        } else {
            let key_field = node.key_field().clone();
            (node, key_field)
        };
        let node = GroupByNode::try_new(input, exprs, key_field, registry, &stacker)?;
        Ok(Self {
            node: PlanNode::GroupBy(node),
            registry,
            config,
            stacker,
        })
    }

    /// Aggregate a grouped input. The output value columns are the grouping
    /// columns followed by one column per aggregation; a missing alias
    /// defaults to `FSQL_COL_{i}` with `i` the aggregation's position.
    pub fn aggregate(
        self,
        aggregations: Vec<(Option<ColumnName>, FunctionCall)>,
        window: Option<WindowExpression>,
    ) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let group_exprs = match &node {
            PlanNode::GroupBy(group_by) => group_by.group_expressions().to_vec(),
            _ => return internal_err!("aggregate requires a grouped input"),
        };
        let input_schema = node.schema().clone();

        let mut values: Vec<(ColumnName, SqlType)> =
            Vec::with_capacity(group_exprs.len() + aggregations.len());
        for expr in &group_exprs {
            let name = match expr.as_column() {
                Some(reference) => reference.name.clone(),
                None => ColumnName::new(expr.to_string()),
            };
            let sql_type = expr_type(expr, &input_schema, registry)?.ok_or_else(|| {
                Error::TypeMismatch(format!("cannot infer the type of grouping {expr}"))
            })?;
            values.push((name, sql_type));
        }
        let non_aggregate_columns = values.len();

        let named: Vec<(ColumnName, FunctionCall)> = aggregations
            .into_iter()
            .enumerate()
            .map(|(i, (alias, call))| (alias.unwrap_or_else(|| generated_alias(i)), call))
            .collect();
        for (alias, call) in &named {
            let arg = match call.args.first() {
                Some(arg) => expr_type(arg, &input_schema, registry)?,
                None => None,
            };
            let function = registry.aggregate_function(&call.name, arg.as_ref())?;
            values.push((alias.clone(), function.return_type));
        }

        let keys = input_schema
            .key_columns()
            .iter()
            .map(|c| (c.name().clone(), c.sql_type().clone()))
            .collect();
        let output_schema = LogicalSchema::try_new(keys, values)?;
        debug!("aggregate schema {output_schema}");

        let node = match window {
            None => PlanNode::Aggregate(AggregateNode::try_new(
                node,
                non_aggregate_columns,
                named,
                output_schema,
                registry,
                &stacker,
            )?),
            Some(window) => PlanNode::WindowedAggregate(WindowedAggregateNode::try_new(
                node,
                non_aggregate_columns,
                named,
                window,
                output_schema,
                registry,
                &config,
                &stacker,
            )?),
        };
        Ok(Self {
            node,
            registry,
            config,
            stacker,
        })
    }

    /// Join against another plan. The joiner is selected by the two node
    /// types; `within` is required for stream-stream joins and forbidden
    /// otherwise.
    pub fn join(
        self,
        right: PlanNode,
        join_type: JoinType,
        key: JoinKey,
        within: Option<WithinExpression>,
    ) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let node = plan_join(node, right, join_type, key, within, &stacker)?;
        Ok(Self {
            node,
            registry,
            config,
            stacker,
        })
    }

    /// Re-key on a column. A no-op when the stream is already keyed as
    /// requested; under the legacy key-field semantics only an exact
    /// key-field match is a no-op.
    pub fn partition_by(self, column: ColumnRef) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let already_keyed = {
            let schema = node.schema();
            let target = schema
                .find_value_column(&column)
                .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
            match node.key_field().resolve(schema) {
                Some(key_column) => key_column == target,
                None => {
                    !config.legacy_key_field_semantics
                        && target.name().as_str() == ROWKEY_NAME
                }
            }
        };
        if already_keyed {
            debug!("partition by {column} is a no-op");
            return Ok(Self {
                node,
                registry,
                config,
                stacker,
            });
        }
        let node =
            RepartitionNode::try_new(node, vec![Expr::Column(column)], registry, &stacker)?;
        Ok(Self {
            node: PlanNode::Repartition(node),
            registry,
            config,
            stacker,
        })
    }

    /// Terminate the plan into a sink topic.
    pub fn sink(self, topic: impl Into<String>, value_format: Format) -> Result<Self> {
        let Self {
            node,
            registry,
            config,
            stacker,
        } = self;
        let node = SinkNode::new(node, topic, value_format, &stacker);
        Ok(Self {
            node: PlanNode::Sink(node),
            registry,
            config,
            stacker,
        })
    }

    pub fn schema(&self) -> &LogicalSchema {
        self.node.schema()
    }

    pub fn key_field(&self) -> &KeyField {
        self.node.key_field()
    }

    pub fn build(self) -> PlanNode {
        self.node
    }
}

fn default_alias(expr: &Expr, position: usize) -> ColumnName {
    match expr {
        Expr::Column(reference) => reference.name.clone(),
        Expr::GetField { field, .. } => ColumnName::new(field.clone()),
        _ => generated_alias(position),
    }
}
