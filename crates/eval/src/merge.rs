//! Document merge driver.
//!
//! Walks a set of merge-field names, evaluates each through the mapping
//! context and writes the results into a [`DocumentSink`].

use policydoc_mapping::{MappingContext, MappingDetail, MappingDictionary};
use serde::Serialize;

use crate::error::EvalError;
use crate::evaluate::Evaluator;
use crate::field::FieldSource;
use crate::path::{PathError, PathQuery};
use crate::sink::DocumentSink;

/// What a merge did with each requested field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Fields written with a non-empty value.
    pub filled: Vec<String>,
    /// Fields that evaluated to the empty string.
    pub empty: Vec<String>,
    /// Names absent from both dictionaries.
    pub unmapped: Vec<String>,
}

/// Evaluate and write each of `names`.
///
/// Empty results from built-in mappings are still written so the field
/// is cleared; an empty result from a custom function leaves the sink as
/// the function left it. The first evaluation error aborts the merge.
pub fn merge_fields<'n, T: FieldSource + ?Sized>(
    context: &MappingContext,
    evaluator: &Evaluator<'_, T>,
    object: &T,
    projection: &serde_json::Value,
    sink: &mut dyn DocumentSink,
    names: impl IntoIterator<Item = &'n str>,
) -> Result<MergeReport, EvalError> {
    let mut report = MergeReport::default();
    for name in names {
        let Some(detail) = context.lookup(name) else {
            tracing::debug!(field = name, "no mapping for field");
            report.unmapped.push(name.to_string());
            continue;
        };
        let value = evaluator
            .evaluate(detail, object, projection, sink)
            .map_err(|e| e.in_field(name))?;
        if value.is_empty() {
            if detail.custom_function().is_none() {
                sink.set_field(name, "");
            }
            report.empty.push(name.to_string());
        } else {
            sink.set_field(name, &value);
            report.filled.push(name.to_string());
        }
    }
    Ok(report)
}

/// Merge every field mapped by either dictionary, in name order.
pub fn merge_all<T: FieldSource + ?Sized>(
    context: &MappingContext,
    evaluator: &Evaluator<'_, T>,
    object: &T,
    projection: &serde_json::Value,
    sink: &mut dyn DocumentSink,
) -> Result<MergeReport, EvalError> {
    let names = context.field_names();
    merge_fields(context, evaluator, object, projection, sink, names)
}

/// Compile every `jsonPath` in `dictionary`.
///
/// Returns the number of queries checked, or every field whose tree holds
/// a malformed query.
pub fn validate_paths(dictionary: &MappingDictionary) -> Result<usize, Vec<(String, PathError)>> {
    let mut checked = 0;
    let mut failures = Vec::new();
    for (name, detail) in dictionary.iter() {
        detail.walk(&mut |node: &MappingDetail| {
            if let Some(query) = node.path_query() {
                checked += 1;
                if let Err(e) = PathQuery::parse(query) {
                    failures.push((name.to_string(), e));
                }
            }
        });
    }
    if failures.is_empty() {
        Ok(checked)
    } else {
        Err(failures)
    }
}
