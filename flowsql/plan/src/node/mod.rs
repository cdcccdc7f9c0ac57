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

//! The relational plan tree.
//!
//! Every node carries its output schema, output key field, output node type
//! (stream or table) and the query-context path used for naming. Nodes are
//! immutable values; the tree is the planner's output (§ plan emission) and
//! no wire format is defined for it.

pub mod aggregate;
pub mod filter;
pub mod group_by;
pub mod join;
pub mod project;
pub mod repartition;
pub mod sink;
pub mod source;

pub use aggregate::{AggregateNode, Aggregation, WindowedAggregateNode};
pub use filter::FilterNode;
pub use group_by::{grouped_key_name, rekey_required, GroupByNode, GROUP_BY_SEPARATOR};
pub use join::{
    JoinCore, JoinKey, JoinType, StreamStreamJoinNode, StreamTableJoinNode, TableTableJoinNode,
};
pub use project::{ProjectNode, SelectExpression};
pub use repartition::RepartitionNode;
pub use sink::SinkNode;
pub use source::SourceNode;

use flowsql_expr::schema::LogicalSchema;

use crate::key_field::KeyField;
use crate::query_context::QueryContext;

/// Whether a node produces an append-only stream or a changelog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Stream,
    Table,
}

/// A node of the plan tree.
#[derive(Debug, Clone)]
pub enum PlanNode {
    Source(SourceNode),
    Project(ProjectNode),
    Filter(FilterNode),
    GroupBy(GroupByNode),
    Aggregate(AggregateNode),
    WindowedAggregate(WindowedAggregateNode),
    StreamStreamJoin(StreamStreamJoinNode),
    StreamTableJoin(StreamTableJoinNode),
    TableTableJoin(TableTableJoinNode),
    Repartition(RepartitionNode),
    Sink(SinkNode),
}

impl PlanNode {
    pub fn schema(&self) -> &LogicalSchema {
        match self {
            PlanNode::Source(n) => n.schema(),
            PlanNode::Project(n) => n.schema(),
            PlanNode::Filter(n) => n.schema(),
            PlanNode::GroupBy(n) => n.schema(),
            PlanNode::Aggregate(n) => n.schema(),
            PlanNode::WindowedAggregate(n) => n.schema(),
            PlanNode::StreamStreamJoin(n) => n.core().schema(),
            PlanNode::StreamTableJoin(n) => n.core().schema(),
            PlanNode::TableTableJoin(n) => n.core().schema(),
            PlanNode::Repartition(n) => n.schema(),
            PlanNode::Sink(n) => n.schema(),
        }
    }

    pub fn key_field(&self) -> &KeyField {
        match self {
            PlanNode::Source(n) => n.key_field(),
            PlanNode::Project(n) => n.key_field(),
            PlanNode::Filter(n) => n.key_field(),
            PlanNode::GroupBy(n) => n.key_field(),
            PlanNode::Aggregate(n) => n.key_field(),
            PlanNode::WindowedAggregate(n) => n.key_field(),
            PlanNode::StreamStreamJoin(n) => n.core().key_field(),
            PlanNode::StreamTableJoin(n) => n.core().key_field(),
            PlanNode::TableTableJoin(n) => n.core().key_field(),
            PlanNode::Repartition(n) => n.key_field(),
            PlanNode::Sink(n) => n.key_field(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            PlanNode::Source(n) => n.node_type(),
            PlanNode::Project(n) => n.node_type(),
            PlanNode::Filter(n) => n.node_type(),
            PlanNode::GroupBy(n) => n.node_type(),
            PlanNode::Aggregate(n) => n.node_type(),
            PlanNode::WindowedAggregate(n) => n.node_type(),
            PlanNode::StreamStreamJoin(n) => n.core().node_type(),
            PlanNode::StreamTableJoin(n) => n.core().node_type(),
            PlanNode::TableTableJoin(n) => n.core().node_type(),
            PlanNode::Repartition(n) => n.node_type(),
            PlanNode::Sink(n) => n.node_type(),
        }
    }

    pub fn query_context(&self) -> &QueryContext {
        match self {
            PlanNode::Source(n) => n.query_context(),
            PlanNode::Project(n) => n.query_context(),
            PlanNode::Filter(n) => n.query_context(),
            PlanNode::GroupBy(n) => n.query_context(),
            PlanNode::Aggregate(n) => n.query_context(),
            PlanNode::WindowedAggregate(n) => n.query_context(),
            PlanNode::StreamStreamJoin(n) => n.core().query_context(),
            PlanNode::StreamTableJoin(n) => n.core().query_context(),
            PlanNode::TableTableJoin(n) => n.core().query_context(),
            PlanNode::Repartition(n) => n.query_context(),
            PlanNode::Sink(n) => n.query_context(),
        }
    }

    pub fn inputs(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Source(_) => vec![],
            PlanNode::Project(n) => vec![n.input()],
            PlanNode::Filter(n) => vec![n.input()],
            PlanNode::GroupBy(n) => vec![n.input()],
            PlanNode::Aggregate(n) => vec![n.input()],
            PlanNode::WindowedAggregate(n) => vec![n.input()],
            PlanNode::StreamStreamJoin(n) => vec![n.core().left(), n.core().right()],
            PlanNode::StreamTableJoin(n) => vec![n.core().left(), n.core().right()],
            PlanNode::TableTableJoin(n) => vec![n.core().left(), n.core().right()],
            PlanNode::Repartition(n) => vec![n.input()],
            PlanNode::Sink(n) => vec![n.input()],
        }
    }

    /// The partition count of the source feeding this node, following the
    /// left input through joins. `None` if it cannot be derived.
    pub fn source_partitions(&self) -> Option<u32> {
        match self {
            PlanNode::Source(n) => Some(n.partition_count()),
            other => other.inputs().first().and_then(|n| n.source_partitions()),
        }
    }
}
