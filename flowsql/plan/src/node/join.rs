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

//! Join nodes and the joiner selection rules.
//!
//! The joiner is picked by the `(left, right)` node types: stream-stream
//! (WITHIN required), stream-table and table-table (WITHIN forbidden);
//! table-stream is illegal. All joins require matching partition counts and
//! a criterion naming one value column on each side. The output schema is
//! the synthetic `ROWKEY STRING` key followed by the left then right value
//! columns; the output key field of an INNER or LEFT join is the
//! left-alias-qualified left key field (`ROWKEY` when absent), and an OUTER
//! join has none.

use flowsql_common::error::{Error, Result};
use flowsql_expr::schema::{ColumnRef, LogicalSchema, ROWKEY_NAME};
use log::debug;

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};
use crate::window::{JoinWindow, WithinExpression};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Outer,
}

/// The join criterion: one value column on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    pub left: ColumnRef,
    pub right: ColumnRef,
}

impl JoinKey {
    pub fn new(left: ColumnRef, right: ColumnRef) -> Self {
        Self { left, right }
    }
}

/// State shared by the three join nodes.
#[derive(Debug, Clone)]
pub struct JoinCore {
    left: Box<PlanNode>,
    right: Box<PlanNode>,
    join_type: JoinType,
    key: JoinKey,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl JoinCore {
    pub fn left(&self) -> &PlanNode {
        &self.left
    }

    pub fn right(&self) -> &PlanNode {
        &self.right
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn key(&self) -> &JoinKey {
        &self.key
    }

    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
    }

    pub fn key_field(&self) -> &KeyField {
        &self.key_field
    }

    pub fn node_type(&self) -> NodeType {
        if self.left.node_type() == NodeType::Table && self.right.node_type() == NodeType::Table
        {
            NodeType::Table
        } else {
            NodeType::Stream
        }
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.context
    }
}

/// A windowed join of two streams.
#[derive(Debug, Clone)]
pub struct StreamStreamJoinNode {
    core: JoinCore,
    window: JoinWindow,
}

impl StreamStreamJoinNode {
    pub fn core(&self) -> &JoinCore {
        &self.core
    }

    pub fn window(&self) -> JoinWindow {
        self.window
    }
}

/// A stream looking up the latest table row per key.
#[derive(Debug, Clone)]
pub struct StreamTableJoinNode {
    core: JoinCore,
}

impl StreamTableJoinNode {
    pub fn core(&self) -> &JoinCore {
        &self.core
    }
}

/// A changelog join of two tables.
#[derive(Debug, Clone)]
pub struct TableTableJoinNode {
    core: JoinCore,
}

impl TableTableJoinNode {
    pub fn core(&self) -> &JoinCore {
        &self.core
    }
}

/// Select the joiner for `(left, right)`, enforce the join rules, and build
/// the node.
pub(crate) fn plan_join(
    left: PlanNode,
    right: PlanNode,
    join_type: JoinType,
    key: JoinKey,
    within: Option<WithinExpression>,
    stacker: &Stacker,
) -> Result<PlanNode> {
    check_partitions(&left, &right)?;
    check_join_key(&left, &key.left)?;
    check_join_key(&right, &key.right)?;

    let schema = left.schema().join(right.schema())?;
    let key_field = result_key_field(join_type, &left).validated(&schema)?;
    debug!(
        "planning {:?}/{:?} {join_type:?} join on {} = {}; key field {key_field}",
        left.node_type(),
        right.node_type(),
        key.left,
        key.right,
    );

    let core = |context: QueryContext| JoinCore {
        left: Box::new(left.clone()),
        right: Box::new(right.clone()),
        join_type,
        key: key.clone(),
        schema: schema.clone(),
        key_field: key_field.clone(),
        context,
    };

    match (left.node_type(), right.node_type()) {
        (NodeType::Stream, NodeType::Stream) => {
            let within = within.ok_or(Error::WithinRequired)?;
            let context = stacker.push("StreamStreamJoin").query_context();
            Ok(PlanNode::StreamStreamJoin(StreamStreamJoinNode {
                core: core(context),
                window: within.join_window(),
            }))
        }
        (NodeType::Stream, NodeType::Table) => {
            if within.is_some() {
                return Err(Error::WithinForbidden);
            }
            check_table_key(&right, &key.right)?;
            let context = stacker.push("StreamTableJoin").query_context();
            Ok(PlanNode::StreamTableJoin(StreamTableJoinNode {
                core: core(context),
            }))
        }
        (NodeType::Table, NodeType::Table) => {
            if within.is_some() {
                return Err(Error::WithinForbidden);
            }
            check_table_key(&left, &key.left)?;
            check_table_key(&right, &key.right)?;
            let context = stacker.push("TableTableJoin").query_context();
            Ok(PlanNode::TableTableJoin(TableTableJoinNode {
                core: core(context),
            }))
        }
        (NodeType::Table, NodeType::Stream) => Err(Error::JoinCombinationIllegal(
            "a table cannot be joined against a stream on its right".to_string(),
        )),
    }
}

fn check_partitions(left: &PlanNode, right: &PlanNode) -> Result<()> {
    if let (Some(l), Some(r)) = (left.source_partitions(), right.source_partitions()) {
        if l != r {
            return Err(Error::PartitionCountMismatch { left: l, right: r });
        }
    }
    Ok(())
}

fn check_join_key(side: &PlanNode, column: &ColumnRef) -> Result<()> {
    side.schema()
        .find_value_column(column)
        .map(|_| ())
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))
}

/// A table input must be keyed by the declared join field or by `ROWKEY`.
fn check_table_key(table: &PlanNode, join_column: &ColumnRef) -> Result<()> {
    let Some(key_ref) = table.key_field().name() else {
        // no declared key: the table is keyed by ROWKEY
        return Ok(());
    };
    if key_ref.name.as_str() == ROWKEY_NAME {
        return Ok(());
    }
    let key_column = table.key_field().resolve(table.schema());
    let join_key_column = table.schema().find_value_column(join_column);
    match (key_column, join_key_column) {
        (Some(key), Some(join)) if key == join => Ok(()),
        _ => Err(Error::TableJoinKeyMismatch(format!(
            "table is keyed by {key_ref} but joined on {join_column}"
        ))),
    }
}

fn result_key_field(join_type: JoinType, left: &PlanNode) -> KeyField {
    match join_type {
        // both sides of an OUTER join can be null
        JoinType::Outer => KeyField::none(),
        JoinType::Inner | JoinType::Left => {
            match left.key_field().resolve(left.schema()) {
                Some(column) => KeyField::of(ColumnRef {
                    source: column.source().cloned(),
                    name: column.name().clone(),
                }),
                None => KeyField::of(ColumnRef::bare(ROWKEY_NAME)),
            }
        }
    }
}
