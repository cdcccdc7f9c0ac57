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

//! Logical schema, SQL types, runtime values and the expression tree of the
//! flowsql planner, together with type inference and expression rewriting.

pub mod expr;
pub mod expr_rewriter;
pub mod expr_schema;
pub mod operator;
pub mod registry;
pub mod schema;
pub mod tree_node;
pub mod type_coercion;
pub mod types;
pub mod value;

pub use expr::{binary_expr, col, lit, null_lit, qcol, Expr, FunctionCall};
pub use expr_schema::{expr_type, ExprTypeContext};
pub use operator::Operator;
pub use registry::{
    AggregateFunction, FunctionRegistry, ScalarFunction, SimpleFunctionRegistry,
};
pub use schema::{Column, ColumnRef, LogicalSchema, Namespace};
pub use types::{Field, SqlType};
pub use value::Value;
