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

//! Exact decimal helpers.
//!
//! Decimal arithmetic is exact: the inferred precision and scale are
//! authoritative and results are rescaled to them. An operation whose result
//! cannot be rescaled without rounding is an error, never a silent rounding.

use bigdecimal::BigDecimal;
use flowsql_common::error::{Error, Result};
use flowsql_expr::value::Value;

/// Rescale `d` to exactly `scale` digits and verify it fits `precision`.
pub fn rescale_exact(
    d: &BigDecimal,
    precision: u8,
    scale: u8,
    context: &str,
) -> Result<BigDecimal> {
    if d.fractional_digit_count() > scale as i64 {
        return Err(Error::Evaluation(format!(
            "result of {context} requires rounding to fit DECIMAL({precision}, {scale})"
        )));
    }
    let rescaled = d.with_scale(scale as i64);
    if rescaled.digits() > precision as u64 {
        return Err(Error::Evaluation(format!(
            "numeric overflow: {context} does not fit DECIMAL({precision}, {scale})"
        )));
    }
    Ok(rescaled)
}

/// Widen a numeric value to a decimal, if it is one.
pub fn to_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Integer(i) => Some(BigDecimal::from(*i)),
        Value::Bigint(i) => Some(BigDecimal::from(*i)),
        Value::Decimal(d) => Some(d.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::num_bigint::BigInt;

    fn dec(unscaled: i64, scale: i64) -> BigDecimal {
        BigDecimal::new(BigInt::from(unscaled), scale)
    }

    #[test]
    fn rescale_pads_zeros() {
        let rescaled = rescale_exact(&dec(15, 1), 5, 3, "t").unwrap();
        assert_eq!(rescaled, dec(1500, 3));
    }

    #[test]
    fn rescale_never_rounds() {
        let err = rescale_exact(&dec(12345, 4), 10, 2, "t").unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[test]
    fn rescale_detects_overflow() {
        let err = rescale_exact(&dec(12345, 2), 4, 2, "t").unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }
}
