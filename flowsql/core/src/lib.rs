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

//! flowsql is the logical planning and execution-plan construction core of a
//! streaming SQL engine: it types rows, infers and compiles expressions, and
//! constructs stream/table dataflow plans with key-field and partitioning
//! integrity. Statement parsing, the metadata catalog, serialization formats
//! and the execution runtime are external collaborators.
//!
//! The building blocks live in the member crates, re-exported here:
//!
//! * [`common`] — errors, identifier newtypes, configuration, tree rewriting
//! * [`expr`] — SQL types, schemas, the expression tree and type inference
//! * [`physical_expr`] — row-level evaluators compiled from expressions
//! * [`plan`] — plan nodes, key-field tracking, the join planner and
//!   insert-values

pub use flowsql_common as common;
pub use flowsql_expr as expr;
pub use flowsql_physical_expr as physical_expr;
pub use flowsql_plan as plan;

/// The types most users need, in one import.
pub mod prelude {
    pub use flowsql_common::{
        ColumnName, Error, FormatOptions, FunctionName, PlannerConfig, Result, SourceName,
    };
    pub use flowsql_expr::{
        binary_expr, col, expr_type, lit, null_lit, qcol, ColumnRef, Expr, FunctionCall,
        LogicalSchema, Operator, SimpleFunctionRegistry, SqlType, Value,
    };
    pub use flowsql_physical_expr::create_physical_expr;
    pub use flowsql_plan::{
        Catalog, CatalogSource, Format, JoinKey, JoinType, KeyField, MemoryCatalog, NodeType,
        PlanBuilder, PlanNode, SourceType, WindowExpression, WithinExpression,
    };
}
