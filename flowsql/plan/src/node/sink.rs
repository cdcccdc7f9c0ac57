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

//! The terminal sink node.

use std::sync::Arc;

use flowsql_common::error::Result;
use flowsql_expr::schema::LogicalSchema;

use crate::catalog::Format;
use crate::key_field::KeyField;
use crate::node::{NodeType, PlanNode};
use crate::query_context::{QueryContext, Stacker};
use crate::serializer::{RowSerde, SerializerFactory};

/// Writes the input to a target topic. Schema and key field pass through;
/// nothing builds on top of a sink.
#[derive(Debug, Clone)]
pub struct SinkNode {
    input: Box<PlanNode>,
    topic: String,
    value_format: Format,
    context: QueryContext,
}

impl SinkNode {
    pub fn new(
        input: PlanNode,
        topic: impl Into<String>,
        value_format: Format,
        stacker: &Stacker,
    ) -> Self {
        Self {
            input: Box::new(input),
            topic: topic.into(),
            value_format,
            context: stacker.push("Sink").query_context(),
        }
    }

    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn value_format(&self) -> Format {
        self.value_format
    }

    /// Obtain the byte producer for this sink from the serializer
    /// collaborator.
    pub fn create_serde(
        &self,
        factory: &dyn SerializerFactory,
        key_format: Format,
    ) -> Result<Arc<dyn RowSerde>> {
        factory.create(self.schema(), key_format, self.value_format)
    }

    pub fn schema(&self) -> &LogicalSchema {
        self.input.schema()
    }

    pub fn key_field(&self) -> &KeyField {
        self.input.key_field()
    }

    pub fn node_type(&self) -> NodeType {
        self.input.node_type()
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.context
    }
}
