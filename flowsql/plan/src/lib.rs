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

//! Stream/table plan construction for flowsql: plan nodes with key-field
//! tracking, the join and rekey planner, windows, and the insert-values
//! path, together with the catalog and serializer collaborator contracts.

pub mod builder;
pub mod catalog;
pub mod insert_values;
pub mod key_field;
pub mod node;
pub mod query_context;
pub mod serializer;
pub mod window;

pub use builder::PlanBuilder;
pub use catalog::{Catalog, CatalogSource, Format, MemoryCatalog, SourceType, WindowType};
pub use insert_values::{Clock, InsertRow, InsertValuesPlanner, SystemClock};
pub use key_field::KeyField;
pub use node::{JoinKey, JoinType, NodeType, PlanNode};
pub use query_context::{QueryContext, Stacker};
pub use window::{JoinWindow, WindowExpression, WithinExpression};
