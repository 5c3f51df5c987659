//! The parsed expression node.

use serde::Serialize;

use crate::function::Builtin;

/// One node of a field's value-computation expression.
///
/// Built once by [`crate::build`] and immutable afterwards. The evaluator
/// tries the sources in a fixed order (field, path, built-in, custom)
/// and falls back to `constant` when the result is empty or `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    /// Dotted property path read from the typed object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Path query evaluated against the JSON projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Composite format string such as `{0:C0}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// True iff `function` names something outside the built-in catalogue.
    pub has_function: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<MappingDetail>>,
}

impl MappingDetail {
    /// A node holding only a literal.
    pub fn constant(value: impl Into<String>) -> Self {
        MappingDetail {
            constant: Some(value.into()),
            ..Default::default()
        }
    }

    /// The built-in this node calls, if it calls one.
    pub fn builtin(&self) -> Option<Builtin> {
        if self.has_function {
            return None;
        }
        self.function.as_deref().and_then(Builtin::from_name)
    }

    /// Name of the custom function this node dispatches to, if any.
    pub fn custom_function(&self) -> Option<&str> {
        if !self.has_function {
            return None;
        }
        non_blank(&self.function)
    }

    /// Child nodes in template order; empty when `params` was absent.
    pub fn params(&self) -> &[MappingDetail] {
        self.params.as_deref().unwrap_or(&[])
    }

    pub fn param(&self, index: usize) -> Option<&MappingDetail> {
        self.params().get(index)
    }

    pub fn constant_value(&self) -> Option<&str> {
        non_blank(&self.constant)
    }

    pub fn field_path(&self) -> Option<&str> {
        non_blank(&self.field)
    }

    pub fn path_query(&self) -> Option<&str> {
        non_blank(&self.json_path)
    }

    pub fn format_string(&self) -> Option<&str> {
        non_blank(&self.format)
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a MappingDetail)) {
        visit(self);
        for child in self.params() {
            child.walk(visit);
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
