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

//! Window expressions and the window-bounds selector.

use std::time::Duration;

use flowsql_common::error::{Error, Result};
use flowsql_expr::value::Value;

use crate::catalog::WindowType;

/// The windowing of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowExpression {
    /// Fixed-size, non-overlapping windows.
    Tumbling { size: Duration },
    /// Fixed-size windows advancing by `advance ≤ size`.
    Hopping { size: Duration, advance: Duration },
    /// Variable-length windows separated by an inactivity gap; merged on the
    /// session merger.
    Session { gap: Duration },
}

impl WindowExpression {
    pub fn tumbling(size: Duration) -> Result<Self> {
        if size.is_zero() {
            return Err(Error::InvalidWindow("window size must be positive".into()));
        }
        Ok(WindowExpression::Tumbling { size })
    }

    pub fn hopping(size: Duration, advance: Duration) -> Result<Self> {
        if size.is_zero() || advance.is_zero() {
            return Err(Error::InvalidWindow(
                "window size and advance must be positive".into(),
            ));
        }
        if advance > size {
            return Err(Error::InvalidWindow(format!(
                "advance interval ({advance:?}) must not exceed the window size ({size:?})"
            )));
        }
        Ok(WindowExpression::Hopping { size, advance })
    }

    pub fn session(gap: Duration) -> Result<Self> {
        if gap.is_zero() {
            return Err(Error::InvalidWindow("session gap must be positive".into()));
        }
        Ok(WindowExpression::Session { gap })
    }

    pub fn window_type(&self) -> WindowType {
        match self {
            WindowExpression::Tumbling { .. } => WindowType::Tumbling,
            WindowExpression::Hopping { .. } => WindowType::Hopping,
            WindowExpression::Session { .. } => WindowType::Session,
        }
    }

    /// Whether this window kind merges accumulators (sessions do).
    pub fn requires_merger(&self) -> bool {
        matches!(self, WindowExpression::Session { .. })
    }
}

/// The time bound of a stream-stream join, as written: `WITHIN 10 SECONDS`
/// or `WITHIN (1 MINUTE, 30 SECONDS)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithinExpression {
    before: Duration,
    after: Duration,
}

impl WithinExpression {
    /// A symmetric bound.
    pub fn new(size: Duration) -> Self {
        Self {
            before: size,
            after: size,
        }
    }

    pub fn before_after(before: Duration, after: Duration) -> Self {
        Self { before, after }
    }

    /// The engine-level join window.
    pub fn join_window(&self) -> JoinWindow {
        JoinWindow {
            before: self.before,
            after: self.after,
        }
    }
}

/// The time span a stream-stream join buffers each side for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinWindow {
    pub before: Duration,
    pub after: Duration,
}

/// One concrete window instance, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: i64,
    pub end: i64,
}

/// Rewrites the output slots of the `WINDOWSTART`/`WINDOWEND`
/// pseudo-aggregates to the bounds of the window a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowSelector {
    start_slots: Vec<usize>,
    end_slots: Vec<usize>,
}

impl WindowSelector {
    pub fn new(start_slots: Vec<usize>, end_slots: Vec<usize>) -> Self {
        Self {
            start_slots,
            end_slots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_slots.is_empty() && self.end_slots.is_empty()
    }

    /// Overwrite the bound slots of `row`.
    pub fn apply(&self, bounds: WindowBounds, row: &mut [Value]) {
        for &slot in &self.start_slots {
            if let Some(value) = row.get_mut(slot) {
                *value = Value::Bigint(bounds.start);
            }
        }
        for &slot in &self.end_slots {
            if let Some(value) = row.get_mut(slot) {
                *value = Value::Bigint(bounds.end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hopping_advance_must_not_exceed_size() {
        assert!(WindowExpression::hopping(
            Duration::from_secs(10),
            Duration::from_secs(5)
        )
        .is_ok());
        assert!(matches!(
            WindowExpression::hopping(Duration::from_secs(5), Duration::from_secs(10)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(WindowExpression::tumbling(Duration::ZERO).is_err());
        assert!(WindowExpression::session(Duration::ZERO).is_err());
    }

    #[test]
    fn only_sessions_merge() {
        assert!(WindowExpression::session(Duration::from_secs(1))
            .unwrap()
            .requires_merger());
        assert!(!WindowExpression::tumbling(Duration::from_secs(1))
            .unwrap()
            .requires_merger());
    }

    #[test]
    fn selector_overwrites_bound_slots() {
        let selector = WindowSelector::new(vec![1], vec![2]);
        let mut row = vec![
            Value::String("k".into()),
            Value::Null,
            Value::Null,
            Value::Integer(9),
        ];
        selector.apply(WindowBounds { start: 100, end: 200 }, &mut row);
        assert_eq!(
            row,
            vec![
                Value::String("k".into()),
                Value::Bigint(100),
                Value::Bigint(200),
                Value::Integer(9),
            ]
        );
    }

    #[test]
    fn within_converts_to_join_window() {
        let within = WithinExpression::new(Duration::from_secs(10));
        assert_eq!(
            within.join_window(),
            JoinWindow {
                before: Duration::from_secs(10),
                after: Duration::from_secs(10),
            }
        );
    }
}
