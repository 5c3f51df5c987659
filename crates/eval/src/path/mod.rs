//! Path Resolver: JSONPath queries over the JSON projection.
//!
//! Queries are compiled and run by `jsonpath_lib`. This module adds the
//! pieces a mapping template relies on:
//!
//! - the leading `$` is optional (`Policy.Insured.Name`)
//! - a malformed query is a [`PathError`], while a well-formed query that
//!   matches nothing is `Ok(None)`
//! - results are split into [`Resolved::Scalar`] and [`Resolved::Sequence`]
//!   by the shape of the query
//!
//! Member names are matched exactly.

use serde_json::Value;

/// A query string that is not valid path syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path '{path}': {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

/// A validated path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    source: String,
    rooted: String,
    singular: bool,
}

/// What a query found.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// First match of a singular query.
    Scalar(&'a Value),
    /// Every match of a wildcard, slice, union or deep-scan query, in
    /// document order.
    Sequence(Vec<&'a Value>),
}

impl<'a> Resolved<'a> {
    /// Flatten into a list of items. A scalar that is itself an array
    /// contributes its elements.
    pub fn into_items(self) -> Vec<&'a Value> {
        match self {
            Resolved::Scalar(Value::Array(items)) => items.iter().collect(),
            Resolved::Scalar(v) => vec![v],
            Resolved::Sequence(values) => values,
        }
    }
}

impl PathQuery {
    pub fn parse(path: &str) -> Result<PathQuery, PathError> {
        let trimmed = path.trim();
        let rooted = if trimmed.is_empty() {
            return Err(PathError {
                path: path.to_string(),
                message: "empty query".to_string(),
            });
        } else if trimmed.starts_with('$') {
            trimmed.to_string()
        } else if trimmed.starts_with('[') {
            format!("${}", trimmed)
        } else {
            format!("$.{}", trimmed)
        };

        // Selecting against null runs the parser without touching data.
        jsonpath_lib::select(&Value::Null, &rooted).map_err(|e| PathError {
            path: path.to_string(),
            message: one_line(&e.to_string()),
        })?;

        Ok(PathQuery {
            singular: is_singular_text(&rooted),
            source: path.to_string(),
            rooted,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the query reads as a single value.
    ///
    /// Wildcards, deep scans, slices and unions are sequences. Filters
    /// count as singular: `$.Forms[?(@.Code == 'X')].Edition` used as a
    /// field value reads its first match. Consumers that want every match
    /// of a filter use [`PathQuery::items`].
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// Every node the query matches, in document order.
    pub fn select<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        match jsonpath_lib::select(document, &self.rooted) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(path = self.source.as_str(), error = %e, "path query failed");
                Vec::new()
            }
        }
    }

    /// Every match flattened into items: an array match contributes its
    /// elements.
    pub fn items<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        self.select(document)
            .into_iter()
            .flat_map(|hit| match hit {
                Value::Array(elements) => elements.iter().collect(),
                other => vec![other],
            })
            .collect()
    }

    /// Scalar or sequence result; `None` when nothing matched.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<Resolved<'a>> {
        let mut matches = self.select(document);
        if matches.is_empty() {
            return None;
        }
        if self.singular {
            Some(Resolved::Scalar(matches.swap_remove(0)))
        } else {
            Some(Resolved::Sequence(matches))
        }
    }
}

/// Parse and run `path` against `document` in one step.
pub fn resolve<'a>(document: &'a Value, path: &str) -> Result<Option<Resolved<'a>>, PathError> {
    let query = PathQuery::parse(path)?;
    let resolved = query.resolve(document);
    if resolved.is_none() {
        tracing::debug!(path, "path query matched nothing");
    }
    Ok(resolved)
}

fn one_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a rooted query by its text. Quoted names and filter bodies
/// are skipped.
fn is_singular_text(query: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut prev = '\0';
    for c in query.chars() {
        if let Some(q) = quote {
            if c == q && prev != '\\' {
                quote = None;
            }
            prev = c;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            _ if parens > 0 => {}
            '*' => return false,
            '.' if prev == '.' => return false,
            ':' | ',' if brackets > 0 => return false,
            _ => {}
        }
        prev = c;
    }
    true
}
