//! Expression Evaluator.
//!
//! Turns one [`MappingDetail`] tree into the string written for a field.
//! Each node resolves from the first source it declares, in order:
//!
//! 1. `field`: read off the typed object through [`FieldSource`]
//! 2. `jsonPath`: queried against the JSON projection
//! 3. `function` naming a built-in: interpreted here over evaluated params
//! 4. `function` flagged custom: dispatched through the [`FunctionRegistry`]
//!
//! The node's `format` is then applied, and when the unformatted result
//! renders as empty or `"0"` a non-empty `constant` takes its place.
//! Built-ins evaluate their params left to right; the conditional ones
//! evaluate only the branch they return.

use policydoc_mapping::{Builtin, MappingDetail};
use rust_decimal::Decimal;

use crate::error::EvalError;
use crate::field::FieldSource;
use crate::format;
use crate::numeric;
use crate::path::{PathQuery, Resolved};
use crate::registry::{FunctionRegistry, NamedParams};
use crate::sink::DocumentSink;
use crate::value::Value;

/// Evaluates mapping trees against one typed object type `T`.
///
/// The evaluator holds no state between calls; evaluating the same tree
/// twice with the same inputs yields the same string.
pub struct Evaluator<'r, T: ?Sized> {
    registry: &'r FunctionRegistry<T>,
}

struct Scope<'s, T: ?Sized> {
    object: &'s T,
    projection: &'s serde_json::Value,
    sink: &'s mut dyn DocumentSink,
}

impl<'r, T: FieldSource + ?Sized> Evaluator<'r, T> {
    pub fn new(registry: &'r FunctionRegistry<T>) -> Self {
        Evaluator { registry }
    }

    pub fn registry(&self) -> &'r FunctionRegistry<T> {
        self.registry
    }

    /// Evaluate `detail` to the text written into the document.
    pub fn evaluate(
        &self,
        detail: &MappingDetail,
        object: &T,
        projection: &serde_json::Value,
        sink: &mut dyn DocumentSink,
    ) -> Result<String, EvalError> {
        let mut scope = Scope {
            object,
            projection,
            sink,
        };
        Ok(self.node(detail, &mut scope)?.render())
    }

    fn node(&self, detail: &MappingDetail, scope: &mut Scope<'_, T>) -> Result<Value, EvalError> {
        let raw = self.resolve(detail, scope)?;

        if let Some(constant) = detail.constant_value() {
            let rendered = raw.render();
            if rendered.is_empty() || rendered == "0" {
                return Ok(Value::Text(constant.to_string()));
            }
        }

        match detail.format_string() {
            Some(fmt) if detail.builtin() != Some(Builtin::StringFormat) => {
                Ok(Value::Text(format::apply(fmt, &raw)?))
            }
            _ => Ok(raw),
        }
    }

    fn resolve(&self, detail: &MappingDetail, scope: &mut Scope<'_, T>) -> Result<Value, EvalError> {
        if let Some(path) = detail.field_path() {
            return Ok(match scope.object.read_field(path) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(field = path, %error, "field read failed, using empty value");
                    Value::Null
                }
            });
        }

        if let Some(query) = detail.path_query() {
            let query = PathQuery::parse(query)?;
            return Ok(match query.resolve(scope.projection) {
                None => {
                    tracing::debug!(path = query.as_str(), "path query matched nothing");
                    Value::Null
                }
                Some(Resolved::Scalar(v)) => Value::from_json(v),
                Some(Resolved::Sequence(vs)) => {
                    Value::List(vs.into_iter().map(Value::from_json).collect())
                }
            });
        }

        if let Some(builtin) = detail.builtin() {
            return self.builtin(builtin, detail, scope);
        }

        if let Some(name) = detail.custom_function() {
            let params = named_params(detail);
            tracing::debug!(function = name, "dispatching custom function");
            let result = self
                .registry
                .invoke(name, scope.object, &mut *scope.sink, &params)?;
            return Ok(result.unwrap_or_default());
        }

        if let Some(name) = detail.function.as_deref().filter(|f| !f.trim().is_empty()) {
            return Err(EvalError::UnknownBuiltin {
                name: name.to_string(),
            });
        }

        Ok(Value::Null)
    }

    // ──────────────────────────────────────────────
    // Built-ins
    // ──────────────────────────────────────────────

    fn builtin(
        &self,
        builtin: Builtin,
        detail: &MappingDetail,
        scope: &mut Scope<'_, T>,
    ) -> Result<Value, EvalError> {
        let params = detail.params();
        match builtin {
            Builtin::Sum => {
                let mut terms = Vec::new();
                for param in params {
                    for item in self.node(param, scope)?.into_items() {
                        terms.push(item.as_decimal().unwrap_or(Decimal::ZERO));
                    }
                }
                Ok(Value::Number(numeric::sum(terms)?))
            }

            Builtin::Concat => {
                let mut out = String::new();
                for param in params {
                    out.push_str(&self.node(param, scope)?.render());
                }
                Ok(Value::Text(out))
            }

            Builtin::Join => {
                let Some((separator, rest)) = params.split_first() else {
                    return Ok(Value::Null);
                };
                let separator = self.node(separator, scope)?.render();
                let mut parts = Vec::new();
                for param in rest {
                    for item in self.node(param, scope)?.into_items() {
                        let text = item.render();
                        if !text.is_empty() {
                            parts.push(text);
                        }
                    }
                }
                Ok(Value::Text(parts.join(&separator)))
            }

            Builtin::JoinArray => {
                let Some((separator, rest)) = params.split_first() else {
                    return Ok(Value::Null);
                };
                let separator = self.node(separator, scope)?.render();
                let mut parts = Vec::new();
                for param in rest {
                    for item in self.sequence(param, scope)? {
                        let text = item.render();
                        if !text.is_empty() {
                            parts.push(text);
                        }
                    }
                }
                Ok(Value::Text(parts.join(&separator)))
            }

            Builtin::IfTrue => {
                let condition = self.param(detail, 0, scope)?;
                let branch = if is_true(&condition) { 1 } else { 2 };
                self.param(detail, branch, scope)
            }

            Builtin::IfNull => {
                let value = self.param(detail, 0, scope)?;
                let branch = if value.is_empty() { 1 } else { 2 };
                self.param(detail, branch, scope)
            }

            Builtin::IfNotNull => {
                let value = self.param(detail, 0, scope)?;
                let branch = if value.is_empty() { 2 } else { 1 };
                self.param(detail, branch, scope)
            }

            Builtin::IfNotEqual => {
                let left = self.param(detail, 0, scope)?.render();
                let right = self.param(detail, 1, scope)?.render();
                let branch = if numeric::loosely_equal(&left, &right) { 3 } else { 2 };
                self.param(detail, branch, scope)
            }

            Builtin::IfNotNullEmptyWhitespace => {
                let value = self.param(detail, 0, scope)?.render();
                let branch = if value.trim().is_empty() { 2 } else { 1 };
                self.param(detail, branch, scope)
            }

            Builtin::And | Builtin::Or => {
                let (conditions, then, otherwise) = logical_operands(builtin, params)?;
                let mut outcome = builtin == Builtin::And;
                for condition in conditions {
                    let truth = is_true(&self.node(condition, scope)?);
                    if builtin == Builtin::And && !truth {
                        outcome = false;
                        break;
                    }
                    if builtin == Builtin::Or && truth {
                        outcome = true;
                        break;
                    }
                }
                self.node(if outcome { then } else { otherwise }, scope)
            }

            Builtin::Contains => {
                let haystack = match params.first() {
                    Some(source) => self.sequence(source, scope)?,
                    None => Vec::new(),
                };
                let needle = self.param(detail, 1, scope)?.render();
                let needle = needle.trim();
                let found = haystack
                    .iter()
                    .any(|item| item.render().trim().eq_ignore_ascii_case(needle));
                self.param(detail, if found { 2 } else { 3 }, scope)
            }

            Builtin::StringFormat => {
                let (pattern, args) = match detail.format_string() {
                    Some(fmt) => (fmt.to_string(), params),
                    None => match params.split_first() {
                        Some((first, rest)) => (self.node(first, scope)?.render(), rest),
                        None => return Ok(Value::Null),
                    },
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.node(arg, scope)?);
                }
                let text = if pattern.contains('{') {
                    format::format_composite(&pattern, &values)?
                } else {
                    let first = values.first().cloned().unwrap_or_default();
                    format::format_value(&first, &pattern)?
                };
                Ok(Value::Text(text))
            }

            Builtin::Division => {
                let dividend = self
                    .param(detail, 0, scope)?
                    .as_decimal()
                    .unwrap_or(Decimal::ZERO);
                let Some(divisor) = self.param(detail, 1, scope)?.as_decimal() else {
                    return Ok(Value::Null);
                };
                Ok(numeric::divide(dividend, divisor)?
                    .map(Value::Number)
                    .unwrap_or_default())
            }

            Builtin::Condition => {
                for param in params {
                    if !is_true(&self.node(param, scope)?) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
        }
    }

    /// Evaluate param `index`, or an empty value when it is absent.
    fn param(
        &self,
        detail: &MappingDetail,
        index: usize,
        scope: &mut Scope<'_, T>,
    ) -> Result<Value, EvalError> {
        match detail.param(index) {
            Some(param) => self.node(param, scope),
            None => Ok(Value::Null),
        }
    }

    /// Evaluate a param as a sequence of items.
    ///
    /// A `jsonPath` param yields every match (an array match contributes
    /// its elements), each formatted individually. Any other param is
    /// evaluated normally: a list gives its items, text is split on commas.
    fn sequence(&self, detail: &MappingDetail, scope: &mut Scope<'_, T>) -> Result<Vec<Value>, EvalError> {
        if let (Some(query), None) = (detail.path_query(), detail.field_path()) {
            let query = PathQuery::parse(query)?;
            let items = query.items(scope.projection);
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = Value::from_json(item);
                values.push(match detail.format_string() {
                    Some(fmt) => Value::Text(format::apply(fmt, &value)?),
                    None => value,
                });
            }
            return Ok(values);
        }

        Ok(match self.node(detail, scope)? {
            Value::List(items) => items.into_iter().flat_map(Value::into_items).collect(),
            Value::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Value::from)
                .collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }
}

/// Split AND/OR params into conditions and the two branches.
///
/// The three-param form carries its conditions inside a leading
/// `CONDITION` node; otherwise every param but the last two is a condition.
fn logical_operands(
    builtin: Builtin,
    params: &[MappingDetail],
) -> Result<(&[MappingDetail], &MappingDetail, &MappingDetail), EvalError> {
    if let [block, then, otherwise] = params {
        if block.builtin() == Some(Builtin::Condition) {
            return Ok((block.params(), then, otherwise));
        }
    }
    match params {
        [conditions @ .., then, otherwise] => Ok((conditions, then, otherwise)),
        _ => Err(EvalError::InvalidParams {
            function: builtin.name().to_string(),
            message: format!("expected at least 2 params, got {}", params.len()),
        }),
    }
}

fn is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => other.render().trim().eq_ignore_ascii_case("true"),
    }
}

/// Collect `format`, `constant` and `field` from the immediate params.
/// A later param overwrites an earlier one under the same key.
fn named_params(detail: &MappingDetail) -> NamedParams {
    let mut bag = NamedParams::new();
    for child in detail.params() {
        if let Some(format) = child.format_string() {
            bag.insert("format".to_string(), format.to_string());
        }
        if let Some(constant) = child.constant_value() {
            bag.insert("constant".to_string(), constant.to_string());
        }
        if let Some(field) = child.field_path() {
            bag.insert("field".to_string(), field.to_string());
        }
    }
    bag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionError;
    use crate::sink::MemorySink;
    use policydoc_mapping::build;
    use serde_json::json;

    fn eval(template: serde_json::Value, doc: &serde_json::Value) -> Result<String, EvalError> {
        let dict = build(&json!({ "F": template })).unwrap();
        let registry = FunctionRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut sink = MemorySink::new();
        evaluator.evaluate(dict.get("f").unwrap(), doc, doc, &mut sink)
    }

    #[test]
    fn field_then_format() {
        let doc = json!({"Premium": {"Total": 1500}});
        assert_eq!(
            eval(json!({"field": "Premium.Total", "format": "{0:C0}"}), &doc).unwrap(),
            "$1,500"
        );
    }

    #[test]
    fn missing_field_degrades_to_constant() {
        let doc = json!({});
        assert_eq!(
            eval(json!({"field": "Agent.Name", "constant": "N/A"}), &doc).unwrap(),
            "N/A"
        );
        assert_eq!(eval(json!({"field": "Agent.Name"}), &doc).unwrap(), "");
    }

    #[test]
    fn zero_falls_back_to_constant() {
        let doc = json!({"Deductible": 0});
        assert_eq!(
            eval(json!({"jsonPath": "$.Deductible", "constant": "Waived"}), &doc).unwrap(),
            "Waived"
        );
    }

    #[test]
    fn field_wins_over_path() {
        let doc = json!({"A": "from field", "B": "from path"});
        assert_eq!(
            eval(json!({"field": "A", "jsonPath": "$.B"}), &doc).unwrap(),
            "from field"
        );
    }

    #[test]
    fn wildcard_path_renders_as_list() {
        let doc = json!({"Forms": [{"Code": "IL0017"}, {"Code": "CG0001"}]});
        assert_eq!(
            eval(json!({"jsonPath": "$.Forms[*].Code"}), &doc).unwrap(),
            "IL0017, CG0001"
        );
    }

    #[test]
    fn join_array_and_contains() {
        let doc = json!({"Forms": [{"Code": "IL0017"}, {"Code": "CG0001"}]});
        let joined = json!({"function": "JOINARRAY", "params": [
            {"constant": " | "}, {"jsonPath": "$.Forms[*].Code"}
        ]});
        assert_eq!(eval(joined, &doc).unwrap(), "IL0017 | CG0001");

        let contains = json!({"function": "CONTAINS", "params": [
            {"jsonPath": "$.Forms[*].Code"}, {"constant": "cg0001"},
            {"constant": "X"}, {"constant": " "}
        ]});
        assert_eq!(eval(contains, &doc).unwrap(), "X");

        let filtered = json!({"function": "JOINARRAY", "params": [
            {"constant": "/"}, {"jsonPath": "$.Forms[?(@.Code != 'XX')].Code"}
        ]});
        assert_eq!(eval(filtered, &doc).unwrap(), "IL0017/CG0001");
    }

    #[test]
    fn conditionals_pick_branches() {
        let doc = json!({"Flag": true, "Empty": ""});
        let iftrue = json!({"function": "IFTRUE", "params": [
            {"jsonPath": "$.Flag"}, {"constant": "yes"}, {"constant": "no"}
        ]});
        assert_eq!(eval(iftrue, &doc).unwrap(), "yes");

        let ifnull = json!({"function": "IFNULL", "params": [
            {"jsonPath": "$.Empty"}, {"constant": "none"}, {"constant": "some"}
        ]});
        assert_eq!(eval(ifnull, &doc).unwrap(), "none");

        let blank = json!({"function": "IFNOTNULLEMPTYWHITESPACE", "params": [
            {"constant": "   "}, {"constant": "set"}, {"constant": "blank"}
        ]});
        assert_eq!(eval(blank, &doc).unwrap(), "blank");

        let ifnotnull = json!({"function": "IFNOTNULL", "params": [
            {"jsonPath": "$.Flag"}, {"constant": "present"}
        ]});
        assert_eq!(eval(ifnotnull, &doc).unwrap(), "present");
    }

    #[test]
    fn or_with_condition_block() {
        let doc = json!({});
        let or = json!({"function": "OR", "params": [
            {"function": "CONDITION", "params": [{"constant": "False"}, {"constant": "TRUE"}]},
            {"constant": "any"}, {"constant": "none"}
        ]});
        assert_eq!(eval(or, &doc).unwrap(), "any");
    }

    #[test]
    fn division() {
        let doc = json!({"A": 10, "B": 4, "Z": 0});
        let div = |b: &str| {
            json!({"function": "DIVISION", "params": [{"jsonPath": "$.A"}, {"jsonPath": b}]})
        };
        assert_eq!(eval(div("$.B"), &doc).unwrap(), "2.5");
        assert_eq!(eval(div("$.Z"), &doc).unwrap(), "");
        assert_eq!(eval(div("$.Missing"), &doc).unwrap(), "");
    }

    #[test]
    fn string_format_forms() {
        let doc = json!({"Num": "BOP-1", "Ed": 3});
        let with_format = json!({"function": "STRINGFORMAT", "format": "{0} ed. {1:D2}", "params": [
            {"jsonPath": "$.Num"}, {"jsonPath": "$.Ed"}
        ]});
        assert_eq!(eval(with_format, &doc).unwrap(), "BOP-1 ed. 03");

        let leading = json!({"function": "STRINGFORMAT", "params": [
            {"constant": "Policy {0}"}, {"jsonPath": "$.Num"}
        ]});
        assert_eq!(eval(leading, &doc).unwrap(), "Policy BOP-1");
    }

    #[test]
    fn malformed_path_is_an_error() {
        let err = eval(json!({"jsonPath": "SomeJson.String[that is invalid]"}), &json!({}))
            .unwrap_err();
        assert!(matches!(err, EvalError::Path(_)));
    }

    #[test]
    fn custom_function_receives_named_params() {
        let dict = build(&json!({"Notice": {"function": "StateNotice", "params": [
            {"field": "State"}, {"constant": "Notice for "}
        ]}}))
        .unwrap();
        let mut registry: FunctionRegistry<serde_json::Value> = FunctionRegistry::new();
        registry.register(
            "statenotice",
            |policy: &serde_json::Value, sink: &mut dyn DocumentSink, params: &NamedParams| {
                let field = params.get("field").cloned().unwrap_or_default();
                let state = policy.read_field(&field).map_err(|e| FunctionError::Failed {
                    name: "StateNotice".to_string(),
                    message: e.to_string(),
                })?;
                sink.set_field("StateCode", &state.render());
                let prefix = params.get("constant").cloned().unwrap_or_default();
                Ok(Some(Value::from(format!("{}{}", prefix, state.render()))))
            },
        );
        let doc = json!({"State": "NV"});
        let mut sink = MemorySink::new();
        let out = Evaluator::new(&registry)
            .evaluate(dict.get("notice").unwrap(), &doc, &doc, &mut sink)
            .unwrap();
        assert_eq!(out, "Notice for NV");
        assert_eq!(sink.field("statecode"), Some("NV"));
    }

    #[test]
    fn unregistered_custom_function_propagates() {
        let err = eval(json!({"function": "NoSuchHandler"}), &json!({})).unwrap_err();
        assert!(matches!(err, EvalError::Function(FunctionError::NotRegistered { .. })));
    }

    #[test]
    fn hand_built_unknown_builtin_is_rejected() {
        let detail = MappingDetail {
            function: Some("NOPE".to_string()),
            has_function: false,
            ..Default::default()
        };
        let registry: FunctionRegistry<serde_json::Value> = FunctionRegistry::new();
        let doc = json!({});
        let err = Evaluator::new(&registry)
            .evaluate(&detail, &doc, &doc, &mut MemorySink::new())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownBuiltin {
                name: "NOPE".to_string()
            }
        );
    }
}
