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

//! Evaluator node implementations.

pub mod binary;
pub mod case;
pub mod cast;
pub mod column;
pub mod get_field;
pub mod in_list;
pub mod is_null;
pub mod like;
pub mod literal;
pub mod negative;
pub mod not;
pub mod subscript;

pub use binary::BinaryExpr;
pub use case::CaseExpr;
pub use cast::{cast_value, CastExpr};
pub use column::ColumnExpr;
pub use get_field::GetFieldExpr;
pub use in_list::InListExpr;
pub use is_null::IsNullExpr;
pub use like::{CompiledPattern, LikeExpr, PatternSource};
pub use literal::LiteralExpr;
pub use negative::NegativeExpr;
pub use not::NotExpr;
pub use subscript::SubscriptExpr;
