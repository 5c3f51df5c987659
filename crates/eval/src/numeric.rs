//! Decimal arithmetic and comparison used by the built-in functions.
//!
//! All arithmetic uses `rust_decimal::Decimal` with checked operations;
//! no `f64` anywhere in the evaluation path. Text operands are parsed
//! leniently: surrounding whitespace and thousands separators are
//! accepted, as is scientific notation.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::EvalError;

/// Parse text as a decimal, or `None` when it is not numeric.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Convert a JSON number without going through `f64`.
pub fn decimal_from_json(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    parse_decimal(&number.to_string())
}

/// Render without trailing fractional zeros (`1500.00` -> `1500`).
pub fn to_plain_string(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Checked sum; an empty input sums to zero.
pub fn sum(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, EvalError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| {
            acc.checked_add(v).ok_or_else(|| EvalError::Overflow {
                message: format!("sum overflow adding {} to {}", v, acc),
            })
        })
}

/// Checked division. A zero divisor yields `None`.
pub fn divide(dividend: Decimal, divisor: Decimal) -> Result<Option<Decimal>, EvalError> {
    if divisor.is_zero() {
        return Ok(None);
    }
    dividend
        .checked_div(divisor)
        .map(Some)
        .ok_or_else(|| EvalError::Overflow {
            message: format!("division overflow: {} / {}", dividend, divisor),
        })
}

/// Compare two rendered operands.
///
/// When both sides parse as numbers they compare numerically, so `"1.0"`
/// equals `"1"`; otherwise they compare as text ignoring case and
/// surrounding whitespace.
pub fn loosely_equal(left: &str, right: &str) -> bool {
    match (parse_decimal(left), parse_decimal(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left.trim().eq_ignore_ascii_case(right.trim()),
    }
}
