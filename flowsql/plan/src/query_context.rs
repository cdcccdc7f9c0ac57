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

//! Deterministic naming of plan nodes.
//!
//! Planning the same statement against the same catalog and registry always
//! yields an equal plan tree, generated names included. Node names come from
//! a stacker context handed in by the caller; generated column aliases embed
//! the select-list position.

use flowsql_common::name::ColumnName;

/// Prefix of generated column aliases.
pub const GENERATED_ALIAS_PREFIX: &str = "FSQL_COL_";

/// The generated alias for an unnamed select item at `position`.
pub fn generated_alias(position: usize) -> ColumnName {
    ColumnName::new(format!("{GENERATED_ALIAS_PREFIX}{position}"))
}

/// The path that names a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryContext {
    path: Vec<String>,
}

impl QueryContext {
    pub fn segments(&self) -> &[String] {
        &self.path
    }
}

impl std::fmt::Display for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path.join("/"))
    }
}

/// Builds nested [`QueryContext`]s. Pushing returns a child stacker, so a
/// planner can hand disjoint naming scopes to subtrees.
#[derive(Debug, Clone, Default)]
pub struct Stacker {
    path: Vec<String>,
}

impl Stacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, segment: &str) -> Stacker {
        let mut path = self.path.clone();
        path.push(segment.to_string());
        Stacker { path }
    }

    pub fn query_context(&self) -> QueryContext {
        QueryContext {
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacker_builds_paths() {
        let root = Stacker::new();
        let project = root.push("Project");
        let inner = project.push("Source");
        assert_eq!(project.query_context().to_string(), "Project");
        assert_eq!(inner.query_context().to_string(), "Project/Source");
        // pushing does not mutate the parent
        assert_eq!(root.query_context().to_string(), "");
    }

    #[test]
    fn generated_aliases_embed_the_position() {
        assert_eq!(generated_alias(0).as_str(), "FSQL_COL_0");
        assert_eq!(generated_alias(7).as_str(), "FSQL_COL_7");
    }
}
