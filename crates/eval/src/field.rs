//! Field access: reading a dotted property path off the typed object.
//!
//! There is no runtime reflection, so a typed object exposes its fields
//! either through a [`FieldTable`] of registered accessors or, for JSON
//! policies, through the `FieldSource` impl on `serde_json::Value`.

use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The path names nothing the object knows about.
    #[error("unknown field '{path}'")]
    Unknown { path: String },

    /// An intermediate segment was absent.
    #[error("field '{path}': '{segment}' not found")]
    Missing { path: String, segment: String },

    /// A segment could not be parsed (e.g. a bad `[n]` index).
    #[error("field '{path}': malformed segment '{segment}'")]
    Malformed { path: String, segment: String },
}

/// Something a `field` directive can read from.
pub trait FieldSource {
    fn read_field(&self, path: &str) -> Result<Value, FieldError>;
}

impl FieldSource for serde_json::Value {
    /// Dotted walk with case-insensitive member names and `[n]` indexes,
    /// e.g. `Policy.Locations[0].Address.City`.
    fn read_field(&self, path: &str) -> Result<Value, FieldError> {
        let mut node = self;
        for raw in path.split('.') {
            let segment = raw.trim();
            let (name, indexes) = split_indexes(segment).ok_or_else(|| FieldError::Malformed {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
            if !name.is_empty() {
                node = member(node, name).ok_or_else(|| FieldError::Missing {
                    path: path.to_string(),
                    segment: name.to_string(),
                })?;
            }
            for index in indexes {
                node = node.get(index).ok_or_else(|| FieldError::Missing {
                    path: path.to_string(),
                    segment: format!("{}[{}]", name, index),
                })?;
            }
        }
        Ok(Value::from_json(node))
    }
}

fn member<'a>(node: &'a serde_json::Value, name: &str) -> Option<&'a serde_json::Value> {
    let map = node.as_object()?;
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// `Locations[0][2]` -> `("Locations", [0, 2])`.
fn split_indexes(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return (!segment.is_empty()).then_some((segment, Vec::new()));
    };
    let name = &segment[..open];
    let mut rest = &segment[open..];
    let mut indexes = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indexes.push(inner[..close].trim().parse().ok()?);
        rest = &inner[close + 1..];
    }
    Some((name, indexes))
}

type Accessor<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;

/// Registered accessors for a typed object, keyed by lowercased path.
///
/// ```
/// use policydoc_eval::{FieldTable, Value};
///
/// struct Policy { number: String }
///
/// let table = FieldTable::new()
///     .register("Policy.Number", |p: &Policy| Value::from(p.number.as_str()));
/// let policy = Policy { number: "BOP-1001".to_string() };
/// assert_eq!(table.read(&policy, "policy.number").unwrap().render(), "BOP-1001");
/// ```
pub struct FieldTable<T> {
    accessors: HashMap<String, Accessor<T>>,
}

impl<T> FieldTable<T> {
    pub fn new() -> Self {
        FieldTable {
            accessors: HashMap::new(),
        }
    }

    pub fn register<F>(mut self, path: &str, accessor: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.accessors
            .insert(path.trim().to_lowercase(), Box::new(accessor));
        self
    }

    pub fn read(&self, object: &T, path: &str) -> Result<Value, FieldError> {
        self.accessors
            .get(&path.trim().to_lowercase())
            .map(|accessor| accessor(object))
            .ok_or_else(|| FieldError::Unknown {
                path: path.to_string(),
            })
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.accessors.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl<T> Default for FieldTable<T> {
    fn default() -> Self {
        FieldTable::new()
    }
}

impl<T> fmt::Debug for FieldTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("paths", &self.paths())
            .finish()
    }
}

/// A typed object paired with its accessor table.
#[derive(Debug)]
pub struct Fields<'a, T> {
    pub table: &'a FieldTable<T>,
    pub object: &'a T,
}

impl<T> FieldSource for Fields<'_, T> {
    fn read_field(&self, path: &str) -> Result<Value, FieldError> {
        self.table.read(self.object, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_dotted_walk_ignores_case() {
        let policy = json!({"Insured": {"Name": "Acme Bakery", "Locations": [{"City": "Reno"}]}});
        assert_eq!(
            policy.read_field("insured.name").unwrap(),
            Value::from("Acme Bakery")
        );
        assert_eq!(
            policy.read_field("Insured.Locations[0].City").unwrap(),
            Value::from("Reno")
        );
    }

    #[test]
    fn json_missing_and_malformed() {
        let policy = json!({"Insured": {"Name": "Acme"}});
        assert_eq!(
            policy.read_field("Insured.Phone"),
            Err(FieldError::Missing {
                path: "Insured.Phone".to_string(),
                segment: "Phone".to_string()
            })
        );
        assert!(matches!(
            policy.read_field("Insured[x]"),
            Err(FieldError::Malformed { .. })
        ));
        assert!(matches!(
            policy.read_field("Insured..Name"),
            Err(FieldError::Malformed { .. })
        ));
    }

    #[test]
    fn json_null_leaf_is_a_null_value() {
        let policy = json!({"Expiration": null});
        assert_eq!(policy.read_field("Expiration").unwrap(), Value::Null);
    }

    struct Policy {
        number: String,
        premium: i64,
    }

    #[test]
    fn table_accessors() {
        let table = FieldTable::new()
            .register("Number", |p: &Policy| Value::from(p.number.clone()))
            .register("Premium.Total", |p: &Policy| Value::from(p.premium));
        let policy = Policy {
            number: "CPP-77".to_string(),
            premium: 1250,
        };
        let fields = Fields {
            table: &table,
            object: &policy,
        };
        assert_eq!(fields.read_field("NUMBER").unwrap(), Value::from("CPP-77"));
        assert_eq!(fields.read_field("premium.total").unwrap().render(), "1250");
        assert_eq!(
            fields.read_field("Agent"),
            Err(FieldError::Unknown {
                path: "Agent".to_string()
            })
        );
        assert_eq!(table.paths(), vec!["number", "premium.total"]);
    }
}
