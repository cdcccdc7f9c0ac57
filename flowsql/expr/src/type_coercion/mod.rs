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

//! Type coercion rules for operators.

pub mod binary;

use crate::types::SqlType;

/// The decimal type an integral type widens to when it meets a DECIMAL.
pub fn decimal_of_integral(t: &SqlType) -> Option<SqlType> {
    match t {
        SqlType::Integer => Some(SqlType::Decimal {
            precision: 10,
            scale: 0,
        }),
        SqlType::Bigint => Some(SqlType::Decimal {
            precision: 19,
            scale: 0,
        }),
        _ => None,
    }
}
