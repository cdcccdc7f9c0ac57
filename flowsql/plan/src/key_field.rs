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

//! Key-field tracking.
//!
//! The key field is the value column, if any, whose value equals the
//! partition key for every row a plan node produces. It is a pure attribute
//! recomputed at node construction and carried through every transformation;
//! outer joins in particular produce no key field.

use flowsql_common::error::Result;
use flowsql_common::internal_err;
use flowsql_expr::schema::{Column, ColumnRef, LogicalSchema};

/// The column whose value mirrors the record key, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyField {
    reference: Option<ColumnRef>,
}

impl KeyField {
    pub fn none() -> Self {
        Self { reference: None }
    }

    pub fn of(reference: ColumnRef) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    pub fn name(&self) -> Option<&ColumnRef> {
        self.reference.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.reference.is_none()
    }

    /// The value column this key field names, if any.
    pub fn resolve<'a>(&self, schema: &'a LogicalSchema) -> Option<&'a Column> {
        self.reference
            .as_ref()
            .and_then(|r| schema.find_value_column(r))
    }

    /// Enforce the invariant that a present key field resolves in the node's
    /// output schema.
    pub fn validated(self, schema: &LogicalSchema) -> Result<Self> {
        match &self.reference {
            Some(reference) if schema.find_value_column(reference).is_none() => {
                internal_err!(
                    "key field {reference} does not resolve in schema {schema}"
                )
            }
            _ => Ok(self),
        }
    }

    /// This key field if it still resolves in `schema`, otherwise none.
    /// Used where a transformation may legitimately drop the key column.
    pub fn retained_in(&self, schema: &LogicalSchema) -> Self {
        match self.resolve(schema) {
            Some(_) => self.clone(),
            None => Self::none(),
        }
    }
}

impl std::fmt::Display for KeyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{reference}"),
            None => write!(f, "<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_expr::types::SqlType;

    fn schema() -> LogicalSchema {
        LogicalSchema::builder()
            .value_column("a", SqlType::Integer)
            .build()
            .unwrap()
    }

    #[test]
    fn resolving_key_field_validates() {
        let field = KeyField::of(ColumnRef::bare("a"));
        assert!(field.clone().validated(&schema()).is_ok());
        assert_eq!(
            field.resolve(&schema()).unwrap().name().as_str(),
            "a"
        );
    }

    #[test]
    fn dangling_key_field_is_rejected() {
        let field = KeyField::of(ColumnRef::bare("missing"));
        assert!(field.validated(&schema()).is_err());
    }

    #[test]
    fn retained_in_drops_dangling_names() {
        let field = KeyField::of(ColumnRef::bare("missing"));
        assert_eq!(field.retained_in(&schema()), KeyField::none());
        let field = KeyField::of(ColumnRef::bare("a"));
        assert_eq!(field.retained_in(&schema()), field);
    }
}
