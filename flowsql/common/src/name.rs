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

//! Identifier newtypes and quoting rules.
//!
//! Column, source and function names are values, not strings: the three name
//! kinds are disjoint types so that a key/value or qualified/bare confusion
//! is a compile error rather than a runtime surprise. Equality is
//! case-sensitive; the planner never folds identifier case.

/// How identifiers are rendered into SQL-ish text.
///
/// The quoting predicate is pluggable: the default quotes any name that is
/// not a valid bare identifier or collides with a reserved word, while
/// [`FormatOptions::no_escape`] renders every name verbatim (used for
/// internal, non-parseable output such as log lines).
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    should_quote: fn(&str) -> bool,
}

impl FormatOptions {
    pub fn new(should_quote: fn(&str) -> bool) -> Self {
        Self { should_quote }
    }

    /// Render every identifier bare, regardless of content.
    pub fn no_escape() -> Self {
        Self {
            should_quote: |_| false,
        }
    }

    pub fn should_quote(&self, name: &str) -> bool {
        (self.should_quote)(name)
    }

    /// Render `name`, backtick-quoted if the predicate demands it. Embedded
    /// backticks are doubled.
    pub fn format(&self, name: &str) -> String {
        if self.should_quote(name) {
            format!("`{}`", name.replace('`', "``"))
        } else {
            name.to_string()
        }
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            should_quote: needs_quoting,
        }
    }
}

/// True when `name` cannot be rendered as a bare identifier.
pub fn needs_quoting(name: &str) -> bool {
    !is_valid_identifier(name) || is_reserved(name)
}

/// Bare identifiers start with a letter or underscore and continue with
/// letters, digits or underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reserved words of the statement grammar, sorted for binary search.
static RESERVED_WORDS: &[&str] = &[
    "ADVANCE",
    "ALL",
    "AND",
    "ANY",
    "AS",
    "BETWEEN",
    "BY",
    "CASE",
    "CAST",
    "CHANGES",
    "CREATE",
    "DAY",
    "DAYS",
    "DELETE",
    "DESCRIBE",
    "DISTINCT",
    "DROP",
    "ELSE",
    "EMIT",
    "END",
    "EXISTS",
    "EXPLAIN",
    "FALSE",
    "FROM",
    "FULL",
    "GROUP",
    "HAVING",
    "HOPPING",
    "HOUR",
    "HOURS",
    "IN",
    "INNER",
    "INSERT",
    "INTO",
    "IS",
    "JOIN",
    "KEY",
    "LEFT",
    "LIKE",
    "LIMIT",
    "MILLISECOND",
    "MILLISECONDS",
    "MINUTE",
    "MINUTES",
    "MONTH",
    "MONTHS",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "OUTER",
    "PARTITION",
    "PRINT",
    "RIGHT",
    "SECOND",
    "SECONDS",
    "SELECT",
    "SESSION",
    "SHOW",
    "SINK",
    "SIZE",
    "STREAM",
    "TABLE",
    "THEN",
    "TOPIC",
    "TRUE",
    "TUMBLING",
    "VALUES",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
    "WITHIN",
    "YEAR",
    "YEARS",
];

/// Reserved-word check. The table is upper case; lookup folds case because a
/// reserved word collides however it is written.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

macro_rules! name_type {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                let name = name.into();
                assert!(!name.is_empty(), "names must not be empty");
                Self(name)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Render this name under the given quoting rules.
            pub fn to_quoted_string(&self, options: &FormatOptions) -> String {
                options.format(&self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }
    };
}

name_type! {
    /// The name of a column. Case-sensitive, unqualified.
    ColumnName
}

name_type! {
    /// The name of a stream or table source (or a source alias).
    SourceName
}

/// The name of a scalar or aggregate function.
///
/// Unlike column and source names, function names are folded to upper case at
/// construction: the function registry is the single boundary where lookup is
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        assert!(!name.is_empty(), "names must not be empty");
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FunctionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_are_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn column_names_are_case_sensitive() {
        assert_ne!(ColumnName::new("f0"), ColumnName::new("F0"));
        assert_eq!(ColumnName::new("f0"), ColumnName::new("f0"));
    }

    #[test]
    fn function_names_fold_to_upper_case() {
        assert_eq!(FunctionName::new("count"), FunctionName::new("COUNT"));
        assert_eq!(FunctionName::new("Sum").as_str(), "SUM");
    }

    #[test]
    fn quoting_applies_to_reserved_and_invalid() {
        let options = FormatOptions::default();
        assert_eq!(options.format("foo"), "foo");
        assert_eq!(options.format("SELECT"), "`SELECT`");
        assert_eq!(options.format("select"), "`select`");
        assert_eq!(options.format("with space"), "`with space`");
        assert_eq!(options.format("3col"), "`3col`");
        assert_eq!(options.format("back`tick"), "`back``tick`");
    }

    #[test]
    fn no_escape_renders_verbatim() {
        let options = FormatOptions::no_escape();
        assert_eq!(options.format("SELECT"), "SELECT");
        assert_eq!(options.format("with space"), "with space");
    }
}
