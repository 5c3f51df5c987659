//! `format` directive handling.
//!
//! A format containing `{` is a composite format string such as
//! `"{0:C0}"` or `"Policy {0} of {1}"`; anything else is a bare specifier
//! (`"C0"`, `"MM/dd/yyyy"`) applied to the single value. Items are written
//! `{index[,alignment][:specifier]}` and literal braces are doubled.

pub mod date;
pub mod number;

use crate::numeric;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid format '{format}': {message}")]
pub struct FormatError {
    pub format: String,
    pub message: String,
}

/// Apply a `format` directive to one resolved value.
pub fn apply(format: &str, value: &Value) -> Result<String, FormatError> {
    if format.contains('{') {
        format_composite(format, std::slice::from_ref(value))
    } else {
        format_value(value, format)
    }
}

/// Expand a composite format string against positional arguments.
pub fn format_composite(format: &str, args: &[Value]) -> Result<String, FormatError> {
    let error = |message: String| FormatError {
        format: format.to_string(),
        message,
    };
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                out.push('}');
                i += 2;
            }
            '}' => return Err(error(format!("unmatched '}}' at offset {}", i))),
            '{' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == '}')
                    .ok_or_else(|| error(format!("unterminated item at offset {}", i)))?;
                let item: String = chars[i + 1..i + close].iter().collect();
                out.push_str(&format_item(&item, args).map_err(error)?);
                i += close + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Widest padding a composite item may request.
const MAX_ALIGNMENT: u64 = 1_000_000;

fn format_item(item: &str, args: &[Value]) -> Result<String, String> {
    let (head, spec) = match item.split_once(':') {
        Some((h, s)) => (h, s),
        None => (item, ""),
    };
    let (index, alignment) = match head.split_once(',') {
        Some((idx, align)) => {
            let align: i64 = align
                .trim()
                .parse()
                .map_err(|_| format!("invalid alignment '{}'", align.trim()))?;
            if align.unsigned_abs() > MAX_ALIGNMENT {
                return Err(format!(
                    "alignment {} exceeds the limit of {}",
                    align, MAX_ALIGNMENT
                ));
            }
            (idx, align)
        }
        None => (head, 0),
    };
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid argument index '{}'", index.trim()))?;
    let value = args
        .get(index)
        .ok_or_else(|| format!("argument index {} out of range ({} supplied)", index, args.len()))?;
    let text = format_value(value, spec).map_err(|e| e.message)?;

    let width = usize::try_from(alignment.unsigned_abs()).unwrap_or(usize::MAX);
    Ok(if alignment < 0 {
        format!("{:<width$}", text, width = width)
    } else {
        format!("{:>width$}", text, width = width)
    })
}

/// Render one value under a bare specifier.
///
/// Text that parses as a number or a date is formatted as one when the
/// specifier calls for it; other text passes through unchanged.
pub fn format_value(value: &Value, spec: &str) -> Result<String, FormatError> {
    if spec.is_empty() {
        return Ok(value.render());
    }
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(_) => Ok(value.render()),
        Value::Number(d) => number::format_decimal(*d, spec),
        Value::Date(d) => date::format_datetime(d.midnight(), spec),
        Value::DateTime(dt) => date::format_datetime(*dt, spec),
        Value::Text(s) => {
            if number::is_numeric_spec(spec) {
                if let Some(d) = numeric::parse_decimal(s) {
                    return number::format_decimal(d, spec);
                }
            } else if let Some(dt) = date::parse_date_text(s) {
                return date::format_datetime(dt, spec);
            }
            Ok(s.clone())
        }
        Value::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let text = format_value(item, spec)?;
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Ok(parts.join(", "))
        }
    }
}
