//! End-to-end properties of template evaluation.
//!
//! Each test builds a dictionary from a JSON template with
//! `policydoc_mapping::build` and evaluates fields against a JSON policy
//! that serves as both the typed object and the projection.

use policydoc_eval::{
    resolve, EvalError, Evaluator, FunctionRegistry, MemorySink, PathError, Resolved,
};
use policydoc_mapping::build;
use serde_json::{json, Value};

// ──────────────────────────────────────────────
// Test helpers
// ──────────────────────────────────────────────

fn evaluate(template: Value, field: &str, document: &Value) -> Result<String, EvalError> {
    let dictionary = build(&template).expect("template should build");
    let detail = dictionary.get(field).expect("field should be mapped");
    let registry: FunctionRegistry<Value> = FunctionRegistry::new();
    let mut sink = MemorySink::new();
    Evaluator::new(&registry).evaluate(detail, document, document, &mut sink)
}

fn constant(text: &str) -> Value {
    json!({ "constant": text })
}

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

#[test]
fn constant_only_ignores_inputs() {
    let template = json!({"Carrier": {"constant": "Riverbend Mutual"}});
    for document in [json!({}), json!({"Carrier": "Other"}), json!([1, 2, 3])] {
        assert_eq!(
            evaluate(template.clone(), "carrier", &document).unwrap(),
            "Riverbend Mutual"
        );
    }
}

// ──────────────────────────────────────────────
// SUM
// ──────────────────────────────────────────────

#[test]
fn sum_of_paths_is_unformatted() {
    let template = json!({"TestSum": {"function": "SUM", "params": [
        {"jsonPath": "$.A.B"}, {"jsonPath": "$.A.C"}
    ]}});
    let document = json!({"A": {"B": 5, "C": 7.25}});
    assert_eq!(evaluate(template, "testsum", &document).unwrap(), "12.25");
}

#[test]
fn sum_treats_missing_and_text_as_zero() {
    let template = json!({"Total": {"function": "SUM", "params": [
        {"jsonPath": "$.A"}, {"jsonPath": "$.Missing"}, {"jsonPath": "$.Note"}
    ]}});
    let document = json!({"A": "1,250.50", "Note": "n/a"});
    assert_eq!(evaluate(template, "total", &document).unwrap(), "1250.5");
}

#[test]
fn sum_format_is_independent_of_key_order() {
    let document = json!({"A": {"B": 1000, "C": 500.4}});
    let format_first: Value = serde_json::from_str(
        r#"{"Total": {"format": "{0:C0}", "function": "SUM", "params": [
            {"jsonPath": "$.A.B"}, {"jsonPath": "$.A.C"}]}}"#,
    )
    .unwrap();
    let function_first: Value = serde_json::from_str(
        r#"{"Total": {"function": "SUM", "params": [
            {"jsonPath": "$.A.B"}, {"jsonPath": "$.A.C"}], "format": "{0:C0}"}}"#,
    )
    .unwrap();
    let a = evaluate(format_first, "total", &document).unwrap();
    let b = evaluate(function_first, "total", &document).unwrap();
    assert_eq!(a, "$1,500");
    assert_eq!(a, b);
}

#[test]
fn sum_over_wildcard_adds_every_match() {
    let template = json!({"Premium": {"function": "SUM", "params": [
        {"jsonPath": "$.Coverages[*].Premium"}
    ]}});
    let document = json!({"Coverages": [{"Premium": 100}, {"Premium": 250.5}, {"Premium": "49.5"}]});
    assert_eq!(evaluate(template, "premium", &document).unwrap(), "400");
}

// ──────────────────────────────────────────────
// JOIN / CONCAT
// ──────────────────────────────────────────────

#[test]
fn join_with_separator() {
    let template = json!({"Joined": {"function": "JOIN", "params": [
        constant(","), constant("A"), constant("B"), constant("C"), constant("D")
    ]}});
    assert_eq!(evaluate(template, "joined", &json!({})).unwrap(), "A,B,C,D");
}

#[test]
fn join_skips_empty_parts() {
    let template = json!({"Address": {"function": "JOIN", "params": [
        constant(", "), {"jsonPath": "$.Street"}, {"jsonPath": "$.Suite"}, {"jsonPath": "$.City"}
    ]}});
    let document = json!({"Street": "1 Main St", "City": "Reno"});
    assert_eq!(
        evaluate(template, "address", &document).unwrap(),
        "1 Main St, Reno"
    );
}

#[test]
fn concat_without_separator() {
    let template = json!({"Code": {"function": "CONCAT", "params": [
        constant("A"), constant("B"), constant("C"), constant("D")
    ]}});
    assert_eq!(evaluate(template, "code", &json!({})).unwrap(), "ABCD");
}

// ──────────────────────────────────────────────
// Comparisons and logic
// ──────────────────────────────────────────────

#[test]
fn if_not_equal_is_numeric_aware() {
    let template = |a: &str, b: &str| {
        json!({"Cmp": {"function": "IFNOTEQUAL", "params": [
            constant(a), constant(b), constant("NOTEQUAL"), constant("EQUAL")
        ]}})
    };
    assert_eq!(evaluate(template("0", "0"), "cmp", &json!({})).unwrap(), "EQUAL");
    assert_eq!(evaluate(template("0", "1"), "cmp", &json!({})).unwrap(), "NOTEQUAL");
    assert_eq!(evaluate(template("1.50", "1.5"), "cmp", &json!({})).unwrap(), "EQUAL");
    assert_eq!(evaluate(template("Yes", "YES"), "cmp", &json!({})).unwrap(), "EQUAL");
}

fn and_with_conditions(conditions: Vec<Value>) -> Value {
    json!({"Eligible": {"function": "AND", "params": [
        {"function": "CONDITION", "params": conditions},
        constant("TRUE BRANCH"),
        constant("FALSE BRANCH")
    ]}})
}

#[test]
fn and_with_ten_true_conditions() {
    let conditions = (0..10).map(|_| constant("True")).collect();
    assert_eq!(
        evaluate(and_with_conditions(conditions), "eligible", &json!({})).unwrap(),
        "TRUE BRANCH"
    );
}

#[test]
fn and_with_one_false_condition() {
    let mut conditions: Vec<Value> = (0..10).map(|_| constant("True")).collect();
    conditions[6] = constant("False");
    assert_eq!(
        evaluate(and_with_conditions(conditions), "eligible", &json!({})).unwrap(),
        "FALSE BRANCH"
    );
}

#[test]
fn and_four_param_form_combines_directly() {
    let document = json!({"HasAuto": true, "HasProperty": "true"});
    let template = json!({"Package": {"function": "AND", "params": [
        {"jsonPath": "$.HasAuto"}, {"jsonPath": "$.HasProperty"},
        constant("Package"), constant("Monoline")
    ]}});
    assert_eq!(evaluate(template, "package", &document).unwrap(), "Package");
}

#[test]
fn conditions_can_be_computed() {
    let document = json!({"State": "CA", "Units": 12});
    let template = json!({"Notice": {"function": "AND", "params": [
        {"function": "CONDITION", "params": [
            {"function": "IFNOTEQUAL", "params": [
                {"jsonPath": "$.State"}, constant("CA"), constant("False"), constant("True")
            ]},
            {"function": "IFNOTEQUAL", "params": [
                {"jsonPath": "$.Units"}, constant("12"), constant("False"), constant("True")
            ]}
        ]},
        constant("CA-12"),
        constant("")
    ]}});
    assert_eq!(evaluate(template, "notice", &document).unwrap(), "CA-12");
}

// ──────────────────────────────────────────────
// Path resolution
// ──────────────────────────────────────────────

#[test]
fn unmatched_path_is_none_not_error() {
    let document = json!({"Items": [{"Field1": "x", "Field2": 30}]});
    let result = resolve(&document, "$.Item33[?(@.Field2 == 30)].Field1").unwrap();
    assert_eq!(result, None);

    let template = json!({"Value": {"jsonPath": "$.Item33[?(@.Field2 == 30)].Field1"}});
    assert_eq!(evaluate(template, "value", &document).unwrap(), "");
}

#[test]
fn malformed_path_is_a_distinct_error() {
    let document = json!({"SomeJson": {"String": "x"}});
    let err: PathError = resolve(&document, "SomeJson.String[that is invalid]").unwrap_err();
    assert_eq!(err.path, "SomeJson.String[that is invalid]");

    let template = json!({"Value": {"jsonPath": "SomeJson.String[that is invalid]"}});
    let err = evaluate(template, "value", &document).unwrap_err();
    assert!(matches!(err, EvalError::Path(_)));
}

#[test]
fn filter_picks_matching_element() {
    let document = json!({"Items": [
        {"Field1": "first", "Field2": 10},
        {"Field1": "second", "Field2": 30}
    ]});
    let result = resolve(&document, "$.Items[?(@.Field2 == 30)].Field1").unwrap();
    assert_eq!(result, Some(Resolved::Scalar(&json!("second"))));
}

fn nevada_forms() -> Value {
    json!({"Forms": [
        {"Code": "IL0017", "State": "NV"},
        {"Code": "CG2010", "State": "CA"},
        {"Code": "CG0001", "State": "NV"}
    ]})
}

#[test]
fn join_array_takes_every_filter_match() {
    let template = json!({"StateForms": {"function": "JOINARRAY", "params": [
        constant(","),
        {"jsonPath": "$.Forms[?(@.State == 'NV')].Code"}
    ]}});
    assert_eq!(
        evaluate(template, "stateforms", &nevada_forms()).unwrap(),
        "IL0017,CG0001"
    );
}

#[test]
fn contains_searches_every_filter_match() {
    let template = |needle: &str| {
        json!({"HasForm": {"function": "CONTAINS", "params": [
            {"jsonPath": "$.Forms[?(@.State == 'NV')].Code"},
            constant(needle),
            constant("found"),
            constant("missing")
        ]}})
    };
    let document = nevada_forms();
    assert_eq!(evaluate(template("CG0001"), "hasform", &document).unwrap(), "found");
    assert_eq!(evaluate(template("IL0017"), "hasform", &document).unwrap(), "found");
    assert_eq!(evaluate(template("CG2010"), "hasform", &document).unwrap(), "missing");
}

#[test]
fn filter_as_field_value_reads_first_match() {
    let template = json!({"FirstForm": {"jsonPath": "$.Forms[?(@.State == 'NV')].Code"}});
    assert_eq!(evaluate(template, "firstform", &nevada_forms()).unwrap(), "IL0017");
}

#[test]
fn huge_slice_step_does_not_overflow() {
    let template = json!({"Second": {"jsonPath": "$.A[1::9223372036854775807]"}});
    let document = json!({"A": [1, 2, 3]});
    assert_eq!(evaluate(template, "second", &document).unwrap(), "2");
}

// ──────────────────────────────────────────────
// Determinism
// ──────────────────────────────────────────────

#[test]
fn repeated_evaluation_is_identical() {
    let template = json!({
        "Summary": {"function": "JOIN", "params": [
            constant(" / "),
            {"jsonPath": "$.Number"},
            {"function": "SUM", "format": "{0:N2}", "params": [
                {"jsonPath": "$.Coverages[*].Premium"}
            ]},
            {"function": "IFNULL", "params": [
                {"jsonPath": "$.Agent"}, constant("Direct"), {"jsonPath": "$.Agent"}
            ]}
        ]}
    });
    let document = json!({"Number": "BOP-100", "Coverages": [{"Premium": 1200}, {"Premium": 34.567}]});
    let dictionary = build(&template).unwrap();
    let detail = dictionary.get("summary").unwrap();
    let registry: FunctionRegistry<Value> = FunctionRegistry::new();
    let evaluator = Evaluator::new(&registry);

    let mut sink = MemorySink::new();
    let first = evaluator.evaluate(detail, &document, &document, &mut sink).unwrap();
    let second = evaluator.evaluate(detail, &document, &document, &mut sink).unwrap();
    assert_eq!(first, "BOP-100 / 1,234.57 / Direct");
    assert_eq!(first, second);
}
