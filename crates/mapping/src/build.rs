//! Dictionary Builder: JSON mapping template -> [`MappingDictionary`].
//!
//! Each top-level key becomes one dictionary entry. Its value is
//! descended recursively: redundant wrapper layers are skipped until a
//! directive key appears, `params` arrays become ordered child nodes,
//! and every built-in call has its parameter count checked as soon as
//! its node is complete. A template that fails any check is rejected
//! as a whole.

use serde_json::{Map, Value};
use tracing::debug;

use crate::detail::MappingDetail;
use crate::dictionary::MappingDictionary;
use crate::function::{Arity, Builtin};

/// Errors raised while building a mapping dictionary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The template text is not valid JSON.
    #[error("mapping template is not valid JSON: {0}")]
    Json(String),

    /// The template root is not a JSON object.
    #[error("mapping template must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Two field names differ only by case.
    #[error("field '{name}' is defined more than once (names are case-insensitive)")]
    DuplicateField { name: String },

    /// A directive has a value of the wrong shape.
    #[error("field '{field}': invalid directive: {message} in {fragment}")]
    InvalidDirective {
        field: String,
        message: String,
        fragment: String,
    },

    /// A built-in function received the wrong number of parameters.
    #[error(
        "field '{field}': function {function} requires {required} params, got {actual} in {fragment}"
    )]
    Arity {
        field: String,
        function: String,
        required: Arity,
        actual: usize,
        fragment: String,
    },

    /// The 3-parameter AND/OR form without a CONDITION block first.
    #[error(
        "field '{field}': function {function} with 3 params requires a CONDITION first param with at least 2 params, got {actual} in {fragment}"
    )]
    ConditionBlock {
        field: String,
        function: String,
        actual: usize,
        fragment: String,
    },
}

/// Build a dictionary from JSON template text.
pub fn build_str(template: &str) -> Result<MappingDictionary, BuildError> {
    let value: Value =
        serde_json::from_str(template).map_err(|e| BuildError::Json(e.to_string()))?;
    build(&value)
}

/// Build a dictionary from a parsed JSON template.
pub fn build(template: &Value) -> Result<MappingDictionary, BuildError> {
    let entries = template.as_object().ok_or(BuildError::NotAnObject {
        found: json_kind(template),
    })?;

    let mut dictionary = MappingDictionary::new();
    for (name, value) in entries {
        let detail = parse_detail(name, value)?;
        dictionary.insert(name, detail)?;
    }
    debug!(fields = dictionary.len(), "built mapping dictionary");
    Ok(dictionary)
}

// ──────────────────────────────────────────────
// Directive parsing
// ──────────────────────────────────────────────

const DIRECTIVE_KEYS: [&str; 6] = ["constant", "field", "format", "jsonpath", "function", "params"];

fn parse_detail(field: &str, value: &Value) -> Result<MappingDetail, BuildError> {
    let directive = unwrap_directive(value);
    let mut detail = MappingDetail::default();

    match directive {
        Value::Object(map) => {
            for (key, v) in map {
                match key.to_ascii_lowercase().as_str() {
                    "constant" => detail.constant = scalar_text(v),
                    "field" => detail.field = directive_str(field, key, v, directive)?,
                    "format" => detail.format = directive_str(field, key, v, directive)?,
                    "jsonpath" => detail.json_path = directive_str(field, key, v, directive)?,
                    "function" => detail.function = directive_str(field, key, v, directive)?,
                    "params" => detail.params = parse_params(field, v, directive)?,
                    _ => debug!(field, key = key.as_str(), "ignoring unrecognised directive key"),
                }
            }
        }
        Value::Array(items) if items.is_empty() => {}
        Value::Array(items) => {
            return Err(BuildError::InvalidDirective {
                field: field.to_string(),
                message: format!("expected a directive object, found an array of {}", items.len()),
                fragment: render(value),
            });
        }
        scalar => detail.constant = scalar_text(scalar),
    }

    detail.has_function = detail
        .function
        .as_deref()
        .is_some_and(|f| !f.trim().is_empty() && Builtin::from_name(f).is_none());

    validate_arity(field, &detail, value)?;
    Ok(detail)
}

/// Skip wrapper layers: single-element arrays and single-key objects whose
/// key is not a directive and whose value is itself a container.
fn unwrap_directive(mut value: &Value) -> &Value {
    loop {
        match value {
            Value::Array(items) if items.len() == 1 => value = &items[0],
            Value::Object(map) if map.len() == 1 && !has_directive_key(map) => {
                match map.values().next() {
                    Some(inner @ (Value::Object(_) | Value::Array(_))) => value = inner,
                    _ => return value,
                }
            }
            _ => return value,
        }
    }
}

fn has_directive_key(map: &Map<String, Value>) -> bool {
    map.keys()
        .any(|k| DIRECTIVE_KEYS.contains(&k.to_ascii_lowercase().as_str()))
}

fn parse_params(
    field: &str,
    value: &Value,
    directive: &Value,
) -> Result<Option<Vec<MappingDetail>>, BuildError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| parse_detail(field, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(BuildError::InvalidDirective {
            field: field.to_string(),
            message: format!("'params' must be an array, found {}", json_kind(other)),
            fragment: render(directive),
        }),
    }
}

fn directive_str(
    field: &str,
    key: &str,
    value: &Value,
    directive: &Value,
) -> Result<Option<String>, BuildError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(BuildError::InvalidDirective {
            field: field.to_string(),
            message: format!("'{}' must be a string, found {}", key, json_kind(other)),
            fragment: render(directive),
        }),
    }
}

/// Constants accept any scalar; numbers and booleans keep their JSON spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(render(other)),
    }
}

// ──────────────────────────────────────────────
// Arity validation
// ──────────────────────────────────────────────

fn validate_arity(field: &str, detail: &MappingDetail, source: &Value) -> Result<(), BuildError> {
    let Some(builtin) = detail.builtin() else {
        return Ok(());
    };
    let Some(required) = builtin.arity() else {
        return Ok(());
    };

    let actual = detail.params().len();
    if !required.accepts(actual) {
        return Err(BuildError::Arity {
            field: field.to_string(),
            function: builtin.name().to_string(),
            required,
            actual,
            fragment: render(source),
        });
    }

    if matches!(builtin, Builtin::And | Builtin::Or) && actual == 3 {
        let block = &detail.params()[0];
        let block_len = block.params().len();
        if block.builtin() != Some(Builtin::Condition) || block_len < 2 {
            return Err(BuildError::ConditionBlock {
                field: field.to_string(),
                function: builtin.name().to_string(),
                actual: block_len,
                fragment: render(source),
            });
        }
    }
    Ok(())
}

fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unrenderable>".to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
