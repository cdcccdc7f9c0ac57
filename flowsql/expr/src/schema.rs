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

//! The logical schema of a stream or table: ordered key and value columns
//! plus the implicit row-time metadata column.
//!
//! Schemas are immutable; every operation returns a new value. Lookup never
//! folds identifier case.

use flowsql_common::error::{Error, Result};
use flowsql_common::name::{ColumnName, FormatOptions, SourceName};
use itertools::Itertools;

use crate::types::SqlType;

/// Name of the implicit row-time metadata column.
pub const ROWTIME_NAME: &str = "ROWTIME";
/// Name of the synthetic key column.
pub const ROWKEY_NAME: &str = "ROWKEY";

pub fn rowtime_name() -> ColumnName {
    ColumnName::new(ROWTIME_NAME)
}

pub fn rowkey_name() -> ColumnName {
    ColumnName::new(ROWKEY_NAME)
}

/// Which part of the record a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Key,
    Value,
    Meta,
}

/// A possibly-qualified reference to a column, as written in an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub source: Option<SourceName>,
    pub name: ColumnName,
}

impl ColumnRef {
    pub fn bare(name: impl Into<ColumnName>) -> Self {
        Self {
            source: None,
            name: name.into(),
        }
    }

    pub fn qualified(source: impl Into<SourceName>, name: impl Into<ColumnName>) -> Self {
        Self {
            source: Some(source.into()),
            name: name.into(),
        }
    }

    /// Parse `"name"` or `"source.name"`. The split is on the first `.`;
    /// quoted identifiers containing dots must be built with
    /// [`ColumnRef::qualified`] instead.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((source, name)) => Self::qualified(source, name),
            None => Self::bare(text),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A column of a [`LogicalSchema`]: its qualification, name, type, namespace
/// and ordinal position within that namespace. Two columns are equal iff all
/// attributes match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    source: Option<SourceName>,
    name: ColumnName,
    sql_type: SqlType,
    namespace: Namespace,
    index: usize,
}

impl Column {
    pub fn new(
        source: Option<SourceName>,
        name: ColumnName,
        sql_type: SqlType,
        namespace: Namespace,
        index: usize,
    ) -> Self {
        Self {
            source,
            name,
            sql_type,
            namespace,
            index,
        }
    }

    pub fn source(&self) -> Option<&SourceName> {
        self.source.as_ref()
    }

    pub fn name(&self) -> &ColumnName {
        &self.name
    }

    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `"source.name"` when qualified, else `"name"`.
    pub fn full_name(&self) -> String {
        match &self.source {
            Some(source) => format!("{source}.{}", self.name),
            None => self.name.to_string(),
        }
    }

    /// A reference that resolves exactly to this column.
    pub fn to_ref(&self) -> ColumnRef {
        ColumnRef {
            source: self.source.clone(),
            name: self.name.clone(),
        }
    }

    /// Whether `wanted` names this column: qualified references must match
    /// the full name, bare references match the name regardless of
    /// qualification.
    fn matches(&self, wanted: &ColumnRef) -> bool {
        match &wanted.source {
            Some(source) => self.source.as_ref() == Some(source) && self.name == wanted.name,
            None => self.name == wanted.name,
        }
    }

    fn format(&self, options: &FormatOptions) -> String {
        let name = match &self.source {
            Some(source) => format!(
                "{}.{}",
                source.to_quoted_string(options),
                self.name.to_quoted_string(options)
            ),
            None => self.name.to_quoted_string(options),
        };
        match self.namespace {
            Namespace::Key => format!("{name} {} KEY", self.sql_type),
            _ => format!("{name} {}", self.sql_type),
        }
    }
}

/// Ordered key and value columns, plus the implicit `ROWTIME BIGINT`
/// metadata column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalSchema {
    key: Vec<Column>,
    value: Vec<Column>,
    meta: Vec<Column>,
}

impl LogicalSchema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Build a schema from `(name, type)` pairs. An empty key list gets the
    /// synthetic `ROWKEY STRING` key. Duplicate full names within the keys or
    /// within the values are rejected.
    pub fn try_new(
        keys: Vec<(ColumnName, SqlType)>,
        values: Vec<(ColumnName, SqlType)>,
    ) -> Result<Self> {
        let keys = if keys.is_empty() {
            vec![(rowkey_name(), SqlType::String)]
        } else {
            keys
        };
        let key = index_columns(keys, Namespace::Key);
        let value = index_columns(values, Namespace::Value);
        check_unique(&key)?;
        check_unique(&value)?;
        let meta = vec![Column::new(
            None,
            rowtime_name(),
            SqlType::Bigint,
            Namespace::Meta,
            0,
        )];
        Ok(Self { key, value, meta })
    }

    pub fn key_columns(&self) -> &[Column] {
        &self.key
    }

    pub fn value_columns(&self) -> &[Column] {
        &self.value
    }

    pub fn metadata_columns(&self) -> &[Column] {
        &self.meta
    }

    /// The alias every top-level column carries, if any.
    pub fn alias(&self) -> Option<&SourceName> {
        self.key
            .first()
            .and_then(|c| c.source())
            .or_else(|| self.value.first().and_then(|c| c.source()))
    }

    /// Apply `source` to every top-level key, value and metadata column.
    /// Nested struct fields are never re-qualified.
    pub fn with_alias(&self, source: &SourceName) -> Result<Self> {
        if let Some(aliased) = self.columns().find(|c| c.source().is_some()) {
            return Err(Error::AlreadyAliased(aliased.full_name()));
        }
        Ok(self.map_columns(|c| Column {
            source: Some(source.clone()),
            ..c
        }))
    }

    /// Strip the alias from every top-level column.
    pub fn without_alias(&self) -> Result<Self> {
        if self.columns().all(|c| c.source().is_none()) {
            return Err(Error::NotAliased);
        }
        Ok(self.map_columns(|c| Column { source: None, ..c }))
    }

    /// Find a column by bare or qualified name, searching the value, key and
    /// metadata namespaces in that order.
    pub fn find_column(&self, wanted: &ColumnRef) -> Option<&Column> {
        self.find_value_column(wanted)
            .or_else(|| self.find_key_column(wanted))
            .or_else(|| self.meta.iter().find(|c| c.matches(wanted)))
    }

    pub fn find_value_column(&self, wanted: &ColumnRef) -> Option<&Column> {
        self.value.iter().find(|c| c.matches(wanted))
    }

    pub fn find_key_column(&self, wanted: &ColumnRef) -> Option<&Column> {
        self.key.iter().find(|c| c.matches(wanted))
    }

    pub fn is_key_column(&self, wanted: &ColumnRef) -> bool {
        self.find_key_column(wanted).is_some()
    }

    pub fn is_meta_column(&self, wanted: &ColumnRef) -> bool {
        self.meta.iter().any(|c| c.matches(wanted))
    }

    /// The ordinal position of a value column, if it resolves.
    pub fn value_column_index(&self, wanted: &ColumnRef) -> Option<usize> {
        self.find_value_column(wanted).map(|c| c.index())
    }

    /// Copy the metadata and key columns into the front of the value columns:
    /// `ROWTIME`, then the keys, then the remaining values. Any prior
    /// occurrence is removed first, which makes the operation idempotent.
    pub fn with_meta_and_key_cols_in_value(&self) -> Self {
        let mut values: Vec<(Option<SourceName>, ColumnName, SqlType)> = Vec::new();
        for c in self.meta.iter().chain(self.key.iter()) {
            values.push((c.source.clone(), c.name.clone(), c.sql_type.clone()));
        }
        for c in &self.value {
            if !is_meta_or_key_name(&c.name) {
                values.push((c.source.clone(), c.name.clone(), c.sql_type.clone()));
            }
        }
        Self {
            key: self.key.clone(),
            value: reindex(values, Namespace::Value),
            meta: self.meta.clone(),
        }
    }

    /// Remove any metadata/key copies from the value columns. Inverse of
    /// [`LogicalSchema::with_meta_and_key_cols_in_value`] modulo aliasing.
    pub fn without_meta_and_key_cols_in_value(&self) -> Self {
        let values = self
            .value
            .iter()
            .filter(|c| !is_meta_or_key_name(&c.name))
            .map(|c| (c.source.clone(), c.name.clone(), c.sql_type.clone()))
            .collect();
        Self {
            key: self.key.clone(),
            value: reindex(values, Namespace::Value),
            meta: self.meta.clone(),
        }
    }

    /// Whether the value columns currently carry the meta/key copies.
    pub fn value_contains_meta_and_key(&self) -> bool {
        self.value.iter().any(|c| is_meta_or_key_name(&c.name))
    }

    /// Replace the key columns with the synthetic `ROWKEY STRING`, keeping
    /// the alias of the previous key if it had one.
    pub fn with_synthetic_key(&self) -> Self {
        let source = self.key.first().and_then(|c| c.source().cloned());
        Self {
            key: vec![Column {
                source,
                name: rowkey_name(),
                sql_type: SqlType::String,
                namespace: Namespace::Key,
                index: 0,
            }],
            value: self.value.clone(),
            meta: self.meta.clone(),
        }
    }

    /// The schema of a join result: the synthetic `ROWKEY STRING` key
    /// followed by this schema's value columns, then `other`'s. Collisions
    /// between the two sides' full names are rejected.
    pub fn join(&self, other: &LogicalSchema) -> Result<Self> {
        let values = self
            .value
            .iter()
            .chain(other.value.iter())
            .map(|c| (c.source.clone(), c.name.clone(), c.sql_type.clone()))
            .collect();
        let joined = Self {
            key: vec![Column::new(
                None,
                rowkey_name(),
                SqlType::String,
                Namespace::Key,
                0,
            )],
            value: reindex(values, Namespace::Value),
            meta: self.meta.iter().map(|c| Column { source: None, ..c.clone() }).collect(),
        };
        check_unique(&joined.value)?;
        Ok(joined)
    }

    /// Render as `[key1 T KEY, …, value1 T, …]` under the given quoting
    /// rules. Stable; used in golden tests.
    pub fn to_string_with_options(&self, options: &FormatOptions) -> String {
        let rendered = self
            .key
            .iter()
            .chain(self.value.iter())
            .map(|c| c.format(options))
            .join(", ");
        format!("[{rendered}]")
    }

    fn columns(&self) -> impl Iterator<Item = &Column> {
        self.key.iter().chain(self.value.iter()).chain(self.meta.iter())
    }

    fn map_columns(&self, f: impl Fn(Column) -> Column) -> Self {
        Self {
            key: self.key.iter().cloned().map(&f).collect(),
            value: self.value.iter().cloned().map(&f).collect(),
            meta: self.meta.iter().cloned().map(&f).collect(),
        }
    }
}

impl std::fmt::Display for LogicalSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_with_options(&FormatOptions::default()))
    }
}

/// Whether `name` is one of the implicit `ROWTIME`/`ROWKEY` columns.
pub fn is_meta_or_key_name(name: &ColumnName) -> bool {
    name.as_str() == ROWTIME_NAME || name.as_str() == ROWKEY_NAME
}

fn index_columns(columns: Vec<(ColumnName, SqlType)>, namespace: Namespace) -> Vec<Column> {
    columns
        .into_iter()
        .enumerate()
        .map(|(index, (name, sql_type))| Column::new(None, name, sql_type, namespace, index))
        .collect()
}

fn reindex(
    columns: Vec<(Option<SourceName>, ColumnName, SqlType)>,
    namespace: Namespace,
) -> Vec<Column> {
    columns
        .into_iter()
        .enumerate()
        .map(|(index, (source, name, sql_type))| Column {
            source,
            name,
            sql_type,
            namespace,
            index,
        })
        .collect()
}

fn check_unique(columns: &[Column]) -> Result<()> {
    for (i, column) in columns.iter().enumerate() {
        let full_name = column.full_name();
        if columns[..i].iter().any(|c| c.full_name() == full_name) {
            return Err(Error::DuplicateColumn(full_name));
        }
    }
    Ok(())
}

/// Incremental construction of a [`LogicalSchema`].
#[derive(Debug, Default)]
pub struct Builder {
    keys: Vec<(ColumnName, SqlType)>,
    values: Vec<(ColumnName, SqlType)>,
}

impl Builder {
    pub fn key_column(mut self, name: impl Into<ColumnName>, sql_type: SqlType) -> Self {
        self.keys.push((name.into(), sql_type));
        self
    }

    pub fn value_column(mut self, name: impl Into<ColumnName>, sql_type: SqlType) -> Self {
        self.values.push((name.into(), sql_type));
        self
    }

    pub fn build(self) -> Result<LogicalSchema> {
        LogicalSchema::try_new(self.keys, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> LogicalSchema {
        LogicalSchema::builder()
            .value_column("f0", SqlType::Integer)
            .value_column("f1", SqlType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn synthetic_key_is_injected() {
        let schema = schema();
        assert_eq!(schema.key_columns().len(), 1);
        assert_eq!(schema.key_columns()[0].name(), &rowkey_name());
        assert_eq!(schema.key_columns()[0].sql_type(), &SqlType::String);
    }

    #[test]
    fn duplicate_values_rejected() {
        let err = LogicalSchema::builder()
            .value_column("f0", SqlType::Integer)
            .value_column("f0", SqlType::String)
            .build()
            .unwrap_err();
        assert_eq!(err, Error::DuplicateColumn("f0".to_string()));
    }

    #[test]
    fn alias_round_trip() {
        let schema = schema();
        let aliased = schema.with_alias(&SourceName::new("S")).unwrap();
        assert_eq!(aliased.value_columns()[0].full_name(), "S.f0");
        assert_eq!(aliased.metadata_columns()[0].full_name(), "S.ROWTIME");
        assert_eq!(aliased.without_alias().unwrap(), schema);
    }

    #[test]
    fn with_alias_rejects_aliased_schema() {
        let aliased = schema().with_alias(&SourceName::new("S")).unwrap();
        assert!(matches!(
            aliased.with_alias(&SourceName::new("T")),
            Err(Error::AlreadyAliased(_))
        ));
        assert_eq!(schema().without_alias(), Err(Error::NotAliased));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let schema = schema();
        assert!(schema.find_value_column(&ColumnRef::bare("f0")).is_some());
        assert!(schema.find_value_column(&ColumnRef::bare("F0")).is_none());
    }

    #[test]
    fn lookup_accepts_bare_and_qualified() {
        let schema = schema().with_alias(&SourceName::new("S")).unwrap();
        assert!(schema.find_value_column(&ColumnRef::bare("f0")).is_some());
        assert!(schema
            .find_value_column(&ColumnRef::qualified("S", "f0"))
            .is_some());
        assert!(schema
            .find_value_column(&ColumnRef::qualified("T", "f0"))
            .is_none());
    }

    #[test]
    fn lookup_order_is_value_key_meta() {
        let schema = LogicalSchema::builder()
            .key_column("k", SqlType::Integer)
            .value_column("k", SqlType::String)
            .build()
            .unwrap();
        let found = schema.find_column(&ColumnRef::bare("k")).unwrap();
        assert_eq!(found.namespace(), Namespace::Value);
        assert!(schema.is_key_column(&ColumnRef::bare("k")));
        assert!(schema.is_meta_column(&ColumnRef::bare("ROWTIME")));
    }

    #[test]
    fn value_column_index_is_positional() {
        let schema = schema();
        assert_eq!(schema.value_column_index(&ColumnRef::bare("f0")), Some(0));
        assert_eq!(schema.value_column_index(&ColumnRef::bare("f1")), Some(1));
        assert_eq!(schema.value_column_index(&ColumnRef::bare("f2")), None);
    }

    #[test]
    fn meta_and_key_projection_round_trips() {
        let schema = schema();
        let projected = schema.with_meta_and_key_cols_in_value();
        let names: Vec<_> = projected
            .value_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["ROWTIME", "ROWKEY", "f0", "f1"]);
        // idempotent
        assert_eq!(projected.with_meta_and_key_cols_in_value(), projected);
        // inverse
        assert_eq!(projected.without_meta_and_key_cols_in_value(), schema);
        assert_eq!(schema.without_meta_and_key_cols_in_value(), schema);
    }

    #[test]
    fn meta_projection_preserves_alias() {
        let aliased = schema().with_alias(&SourceName::new("S")).unwrap();
        let projected = aliased.with_meta_and_key_cols_in_value();
        assert_eq!(projected.value_columns()[0].full_name(), "S.ROWTIME");
        assert_eq!(projected.value_columns()[1].full_name(), "S.ROWKEY");
        assert_eq!(projected.without_meta_and_key_cols_in_value(), aliased);
    }

    #[test]
    fn join_concatenates_value_columns_under_synthetic_key() {
        let left = schema().with_alias(&SourceName::new("s")).unwrap();
        let right = schema().with_alias(&SourceName::new("t")).unwrap();
        let joined = left.join(&right).unwrap();
        assert_eq!(joined.key_columns().len(), 1);
        assert_eq!(joined.key_columns()[0].name(), &rowkey_name());
        let names: Vec<_> = joined
            .value_columns()
            .iter()
            .map(|c| c.full_name())
            .collect();
        assert_eq!(names, vec!["s.f0", "s.f1", "t.f0", "t.f1"]);

        // same alias on both sides collides
        assert!(matches!(
            left.join(&left),
            Err(Error::DuplicateColumn(_))
        ));
    }

    #[test]
    fn synthetic_key_replaces_existing_key() {
        let schema = LogicalSchema::builder()
            .key_column("k", SqlType::Integer)
            .value_column("v", SqlType::String)
            .build()
            .unwrap();
        let rekeyed = schema.with_synthetic_key();
        assert_eq!(rekeyed.key_columns().len(), 1);
        assert_eq!(rekeyed.key_columns()[0].name(), &rowkey_name());
        assert_eq!(rekeyed.key_columns()[0].sql_type(), &SqlType::String);
        assert_eq!(rekeyed.value_columns(), schema.value_columns());
    }

    #[test]
    fn rendering_matches_text_format() {
        let schema = LogicalSchema::builder()
            .value_column("a", SqlType::Integer)
            .value_column("b", SqlType::String)
            .build()
            .unwrap();
        assert_eq!(schema.to_string(), "[ROWKEY STRING KEY, a INT, b STRING]");

        let quoted = LogicalSchema::builder()
            .value_column("SELECT", SqlType::Integer)
            .build()
            .unwrap()
            .with_alias(&SourceName::new("S"))
            .unwrap();
        assert_eq!(
            quoted.to_string(),
            "[S.ROWKEY STRING KEY, S.`SELECT` INT]"
        );
    }
}
