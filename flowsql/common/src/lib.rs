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

//! Shared primitives of the flowsql planning core: the error type, identifier
//! newtypes with quoting rules, the planner configuration, and the generic
//! tree-rewriting framework.

pub mod config;
pub mod error;
pub mod name;
pub mod tree_node;

pub use config::PlannerConfig;
pub use error::{Error, Location, Result};
pub use name::{ColumnName, FormatOptions, FunctionName, SourceName};
