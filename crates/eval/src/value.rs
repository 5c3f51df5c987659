//! Runtime values produced while resolving a mapping tree.
//!
//! Field accessors, path queries and functions all yield a [`Value`].
//! Values keep their type until the last moment so that formatting and
//! arithmetic see numbers and dates rather than their text; what finally
//! lands in the document is [`Value::render`].

use std::fmt;

use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime};

use crate::format;
use crate::numeric;

/// All numbers are `rust_decimal::Decimal`; never `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
    Date(Date),
    DateTime(PrimitiveDateTime),
    List(Vec<Value>),
}

impl Value {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::List(_) => "List",
        }
    }

    /// Convert a node of the JSON projection.
    ///
    /// Strings stay text (no date sniffing); objects become their compact
    /// JSON text; numbers outside the decimal range are kept as text.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match numeric::decimal_from_json(n) {
                Some(d) => Value::Number(d),
                None => Value::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Value::Text(value.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, empty text or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.iter().all(Value::is_empty),
            _ => false,
        }
    }

    /// Numeric view: numbers as-is, text parsed leniently.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            Value::Text(s) => numeric::parse_decimal(s),
            _ => None,
        }
    }

    /// The text written into a document.
    ///
    /// Booleans render as `True`/`False`, numbers without trailing zeros,
    /// dates as US short dates, lists as their non-empty items joined
    /// by `", "`.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(d) => numeric::to_plain_string(*d),
            Value::Text(s) => s.clone(),
            Value::Date(d) => format::date::short_date(d.midnight()),
            Value::DateTime(dt) => format::date::general(*dt),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Flatten nested lists into their scalar items.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Value::List(items) => items.into_iter().flat_map(Value::into_items).collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(dt: PrimitiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;
    use time::macros::{date, datetime};

    #[test]
    fn json_numbers_become_decimals() {
        assert_eq!(
            Value::from_json(&json!(10.5)),
            Value::Number(Decimal::from_str("10.5").unwrap())
        );
        assert_eq!(Value::from_json(&json!(3)), Value::Number(Decimal::from(3)));
    }

    #[test]
    fn render_scalars() {
        assert_eq!(Value::Bool(true).render(), "True");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(
            Value::Number(Decimal::from_str("1500.00").unwrap()).render(),
            "1500"
        );
        assert_eq!(Value::Date(date!(2024 - 03 - 07)).render(), "3/7/2024");
        assert_eq!(
            Value::DateTime(datetime!(2024-03-07 14:05:09)).render(),
            "3/7/2024 2:05:09 PM"
        );
    }

    #[test]
    fn render_list_skips_empty_items() {
        let v = Value::from_json(&json!(["A", null, "", "B"]));
        assert_eq!(v.render(), "A, B");
    }

    #[test]
    fn objects_render_as_json() {
        assert_eq!(Value::from_json(&json!({"a": 1})).render(), "{\"a\":1}");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn into_items_flattens() {
        let v = Value::List(vec![
            Value::from(1i64),
            Value::List(vec![Value::from(2i64), Value::from(3i64)]),
        ]);
        assert_eq!(v.into_items().len(), 3);
    }
}
