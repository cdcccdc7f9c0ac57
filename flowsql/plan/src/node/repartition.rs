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

//! The repartition node.

use flowsql_common::error::Result;
use flowsql_expr::expr::Expr;
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::registry::FunctionRegistry;
use flowsql_expr::schema::{is_meta_or_key_name, LogicalSchema};

use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};

/// Re-keys the stream on the given expressions. The output key is a STRING
/// (the synthetic `ROWKEY`); when the partitioning is a single plain column
/// reference, that column becomes the new key field.
#[derive(Debug, Clone)]
pub struct RepartitionNode {
    input: Box<PlanNode>,
    partition_by: Vec<Expr>,
    schema: LogicalSchema,
    key_field: KeyField,
    context: QueryContext,
}

impl RepartitionNode {
    pub fn try_new(
        input: PlanNode,
        partition_by: Vec<Expr>,
        registry: &dyn FunctionRegistry,
        stacker: &Stacker,
    ) -> Result<Self> {
        for expr in &partition_by {
            expr_type(expr, input.schema(), registry)?;
        }
        let schema = input.schema().with_synthetic_key();
        let key_field = match partition_by.as_slice() {
            [expr] => match expr.as_column() {
                Some(reference) => match schema.find_value_column(reference) {
                    Some(column) if !is_meta_or_key_name(column.name()) => {
                        KeyField::of(reference.clone())
                    }
                    _ => KeyField::none(),
                },
                None => KeyField::none(),
            },
            _ => KeyField::none(),
        };
        Ok(Self {
            input: Box::new(input),
            partition_by,
            schema,
            key_field,
            context: stacker.push("Repartition").query_context(),
        })
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn partition_by(&self) -> &[Expr] {
        &self.partition_by
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
