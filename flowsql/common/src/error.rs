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

//! Error types returned by the planning core.
//!
//! Planning never panics and never terminates the process: every failure is
//! surfaced as a typed [`Error`]. When the caller's AST carries a source
//! position the error can be wrapped with [`Error::at`].

use thiserror::Error;

/// Result type used throughout the planner.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A line/column position in the statement text, as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}:{}", self.line, self.column)
    }
}

/// All failures the planning core can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // ---- name / schema errors ----
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("unknown stream or table: {0}")]
    UnknownSource(String),

    #[error("schema is already aliased: {0}")]
    AlreadyAliased(String),

    #[error("schema is not aliased")]
    NotAliased,

    // ---- type errors ----
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("cannot cast {from} to {to}")]
    CastNotSupported { from: String, to: String },

    #[error("CASE branches must produce a common type: {0}")]
    CaseTypeMismatch(String),

    #[error("unsupported arithmetic operand types: {0}")]
    ArithmeticTypeMismatch(String),

    #[error("operands are not comparable: {0}")]
    ComparisonIncompatibleTypes(String),

    #[error("subscript base must be an ARRAY or MAP, got {0}")]
    SubscriptBaseNotContainer(String),

    // ---- expression errors ----
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("function {name} expects {expected} argument(s), got {actual}")]
    FunctionArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("no function overload matches: {0}")]
    FunctionSignatureMismatch(String),

    #[error("invalid timestamp literal: {0}")]
    InvalidTimestampLiteral(String),

    #[error("cannot resolve struct field: {0}")]
    DereferenceUnresolved(String),

    // ---- plan errors ----
    #[error("illegal join: {0}")]
    JoinCombinationIllegal(String),

    #[error("stream-stream joins must specify a WITHIN window")]
    WithinRequired,

    #[error("WITHIN is only valid on stream-stream joins")]
    WithinForbidden,

    #[error("table source must be keyed by the join expression: {0}")]
    TableJoinKeyMismatch(String),

    #[error("partition counts must match: left has {left}, right has {right}")]
    PartitionCountMismatch { left: u32, right: u32 },

    #[error("aggregate schema expects {expected} value column(s), got {actual}")]
    SchemaArityMismatch { expected: usize, actual: usize },

    #[error("{0} must be used inside a windowed aggregation")]
    WindowBoundsWithoutWindow(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    // ---- insert errors ----
    #[error("INSERT INTO supports literal values only: {0}")]
    InsertNonLiteral(String),

    #[error("cannot coerce inserted value: {0}")]
    InsertTypeMismatch(String),

    #[error("expected {expected} value(s), got {actual}")]
    InsertArityMismatch { expected: usize, actual: usize },

    #[error("key column and ROWKEY disagree: {0}")]
    InsertKeyMismatch(String),

    #[error("cannot insert into windowed source {0}")]
    InsertIntoWindowedNotAllowed(String),

    #[error("INSERT INTO VALUES is disabled")]
    InsertDisabled,

    // ---- evaluation / internal ----
    #[error("expression evaluation failed: {0}")]
    Evaluation(String),

    #[error("internal error: {0}. This is likely a bug in flowsql; please file \
        a report in the issue tracker")]
    Internal(String),

    #[error("{source} ({location})")]
    Located {
        location: Location,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a statement-text position to this error.
    pub fn at(self, location: Location) -> Self {
        match self {
            // keep the innermost position
            Error::Located { .. } => self,
            other => Error::Located {
                location,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, unwrapping any location wrapper.
    pub fn inner(&self) -> &Error {
        match self {
            Error::Located { source, .. } => source.inner(),
            other => other,
        }
    }
}

/// Construct an [`Error::Internal`] from format-style arguments.
#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        Err($crate::error::Error::Internal(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_wraps_once() {
        let err = Error::UnknownColumn("foo".to_string())
            .at(Location { line: 3, column: 14 })
            .at(Location { line: 9, column: 1 });

        assert_eq!(
            err.to_string(),
            "unknown column: foo (line 3:14)"
        );
        assert_eq!(err.inner(), &Error::UnknownColumn("foo".to_string()));
    }

    #[test]
    fn internal_err_macro() {
        let res: Result<()> = internal_err!("bad state: {}", 42);
        assert_eq!(
            res.unwrap_err().to_string().contains("bad state: 42"),
            true
        );
    }
}
