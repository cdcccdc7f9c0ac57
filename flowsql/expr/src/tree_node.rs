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

//! Tree node implementation for expressions.

use flowsql_common::error::Result;
use flowsql_common::tree_node::TreeNode;

use crate::expr::{Expr, FunctionCall};

fn map_box<F>(f: &mut F, expr: Box<Expr>) -> Result<Box<Expr>>
where
    F: FnMut(Expr) -> Result<Expr>,
{
    Ok(Box::new(f(*expr)?))
}

impl TreeNode for Expr {
    fn map_children<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(Self) -> Result<Self>,
    {
        Ok(match self {
            leaf @ (Expr::Literal(_) | Expr::Column(_)) => leaf,
            Expr::BinaryExpr { left, op, right } => Expr::BinaryExpr {
                left: map_box(&mut f, left)?,
                op,
                right: map_box(&mut f, right)?,
            },
            Expr::Negative(expr) => Expr::Negative(map_box(&mut f, expr)?),
            Expr::Not(expr) => Expr::Not(map_box(&mut f, expr)?),
            Expr::IsNull(expr) => Expr::IsNull(map_box(&mut f, expr)?),
            Expr::IsNotNull(expr) => Expr::IsNotNull(map_box(&mut f, expr)?),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Expr::Between {
                expr: map_box(&mut f, expr)?,
                negated,
                low: map_box(&mut f, low)?,
                high: map_box(&mut f, high)?,
            },
            Expr::Like {
                expr,
                pattern,
                negated,
            } => Expr::Like {
                expr: map_box(&mut f, expr)?,
                pattern: map_box(&mut f, pattern)?,
                negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: map_box(&mut f, expr)?,
                list: list.into_iter().map(&mut f).collect::<Result<_>>()?,
                negated,
            },
            Expr::Cast { expr, data_type } => Expr::Cast {
                expr: map_box(&mut f, expr)?,
                data_type,
            },
            Expr::Subscript { base, index } => Expr::Subscript {
                base: map_box(&mut f, base)?,
                index: map_box(&mut f, index)?,
            },
            Expr::GetField { base, field } => Expr::GetField {
                base: map_box(&mut f, base)?,
                field,
            },
            Expr::Function(FunctionCall { name, args }) => Expr::Function(FunctionCall {
                name,
                args: args.into_iter().map(&mut f).collect::<Result<_>>()?,
            }),
            Expr::Case {
                operand,
                when_then,
                else_expr,
            } => {
                let operand = match operand {
                    Some(operand) => Some(map_box(&mut f, operand)?),
                    None => None,
                };
                let when_then = when_then
                    .into_iter()
                    .map(|(when, then)| Ok((f(when)?, f(then)?)))
                    .collect::<Result<_>>()?;
                let else_expr = match else_expr {
                    Some(else_expr) => Some(map_box(&mut f, else_expr)?),
                    None => None,
                };
                Expr::Case {
                    operand,
                    when_then,
                    else_expr,
                }
            }
        })
    }

    fn apply_children<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&Self) -> Result<()>,
    {
        match self {
            Expr::Literal(_) | Expr::Column(_) => Ok(()),
            Expr::BinaryExpr { left, right, .. } => {
                f(left)?;
                f(right)
            }
            Expr::Negative(expr)
            | Expr::Not(expr)
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::Cast { expr, .. } => f(expr),
            Expr::Between {
                expr, low, high, ..
            } => {
                f(expr)?;
                f(low)?;
                f(high)
            }
            Expr::Like { expr, pattern, .. } => {
                f(expr)?;
                f(pattern)
            }
            Expr::InList { expr, list, .. } => {
                f(expr)?;
                list.iter().try_for_each(f)
            }
            Expr::Subscript { base, index } => {
                f(base)?;
                f(index)
            }
            Expr::GetField { base, .. } => f(base),
            Expr::Function(call) => call.args.iter().try_for_each(f),
            Expr::Case {
                operand,
                when_then,
                else_expr,
            } => {
                if let Some(operand) = operand {
                    f(operand)?;
                }
                for (when, then) in when_then {
                    f(when)?;
                    f(then)?;
                }
                if let Some(else_expr) = else_expr {
                    f(else_expr)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{binary_expr, col, lit};
    use crate::operator::Operator;

    #[test]
    fn transform_down_replaces_subtrees() {
        // replace every literal with 0
        let expr = binary_expr(
            binary_expr(col("a"), Operator::Plus, lit(1)),
            Operator::Multiply,
            lit(2),
        );
        let rewritten = expr
            .transform_down(&mut |e: &Expr| match e {
                Expr::Literal(_) => Ok(Some(lit(0))),
                _ => Ok(None),
            })
            .unwrap();
        assert!(rewritten.transformed);
        assert_eq!(
            rewritten.data,
            binary_expr(
                binary_expr(col("a"), Operator::Plus, lit(0)),
                Operator::Multiply,
                lit(0),
            )
        );
    }

    #[test]
    fn untouched_tree_reports_no_change() {
        let expr = binary_expr(col("a"), Operator::Plus, col("b"));
        let rewritten = expr.clone().transform_down(&mut |_: &Expr| Ok(None)).unwrap();
        assert!(!rewritten.transformed);
        assert_eq!(rewritten.data, expr);
    }

    #[test]
    fn apply_visits_every_node() {
        let expr = binary_expr(
            col("a"),
            Operator::Plus,
            binary_expr(col("b"), Operator::Multiply, lit(3)),
        );
        let mut count = 0;
        expr.apply(&mut |_: &Expr| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 5);
    }
}
