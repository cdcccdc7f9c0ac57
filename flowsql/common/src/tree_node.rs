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

//! Generic tree rewriting for expression and plan trees.
//!
//! Rewriters are per-node plug-ins: a plug-in either returns a replacement
//! for the node it was handed (in which case the rewrite does not descend
//! into the replacement) or declines, and the rewrite recurses into the
//! node's children. Rewrites are structure-preserving: a node whose subtree
//! is unchanged is returned as-is, and the `transformed` flag reports whether
//! anything changed at all.

use crate::error::Result;

/// A rewritten value plus whether any rewrite actually happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub data: T,
    pub transformed: bool,
}

impl<T> Transformed<T> {
    /// A value that was changed by the rewrite.
    pub fn yes(data: T) -> Self {
        Self {
            data,
            transformed: true,
        }
    }

    /// A value the rewrite left untouched.
    pub fn no(data: T) -> Self {
        Self {
            data,
            transformed: false,
        }
    }

    pub fn update_data<U, F: FnOnce(T) -> U>(self, f: F) -> Transformed<U> {
        Transformed {
            data: f(self.data),
            transformed: self.transformed,
        }
    }
}

/// A tree of owned nodes that can be walked and rebuilt.
pub trait TreeNode: Sized {
    /// Rebuild this node with each direct child passed through `f`.
    fn map_children<F>(self, f: F) -> Result<Self>
    where
        F: FnMut(Self) -> Result<Self>;

    /// Visit each direct child by reference.
    fn apply_children<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&Self) -> Result<()>;

    /// Pre-order rewrite. The plug-in may return `Some(replacement)` to
    /// substitute the whole subtree (children of the replacement are not
    /// visited), or `None` to recurse into the node's children.
    fn transform_down<F>(self, f: &mut F) -> Result<Transformed<Self>>
    where
        F: FnMut(&Self) -> Result<Option<Self>>,
    {
        if let Some(replacement) = f(&self)? {
            return Ok(Transformed::yes(replacement));
        }
        let mut changed = false;
        let data = self.map_children(|child| {
            let child = child.transform_down(f)?;
            changed |= child.transformed;
            Ok(child.data)
        })?;
        Ok(Transformed { data, transformed: changed })
    }

    /// Pre-order visit of the whole tree.
    fn apply<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&Self) -> Result<()>,
    {
        f(self)?;
        self.apply_children(&mut |child| child.apply(f))
    }
}
