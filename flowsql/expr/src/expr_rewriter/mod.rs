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

//! Expression rewriting.

pub mod rowtime;

use flowsql_common::error::Result;
use flowsql_common::tree_node::{Transformed, TreeNode};

use crate::expr::Expr;

/// Rewrite `expr` with a per-node plug-in. Returning `Some(replacement)`
/// substitutes the subtree without descending into it; returning `None`
/// recurses into the node's children.
pub fn rewrite_expr<F>(expr: Expr, mut f: F) -> Result<Transformed<Expr>>
where
    F: FnMut(&Expr) -> Result<Option<Expr>>,
{
    expr.transform_down(&mut f)
}
