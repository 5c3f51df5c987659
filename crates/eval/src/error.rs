//! Errors raised while evaluating mapping trees.
//!
//! A path query that matches nothing and a field that cannot be read are
//! not errors: both resolve to an empty value. What remains here are the
//! failures that mean the template or the plugin set is broken.

use crate::format::FormatError;
use crate::path::PathError;
use crate::registry::FunctionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A `jsonPath` directive is not valid path syntax.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A `format` directive could not be applied.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A custom function is missing or reported failure.
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// A node names a function that is neither built-in nor flagged custom.
    #[error("unknown built-in function '{name}'")]
    UnknownBuiltin { name: String },

    /// A built-in received parameters it cannot work with.
    #[error("function {function}: {message}")]
    InvalidParams { function: String, message: String },

    /// Decimal arithmetic overflowed.
    #[error("numeric overflow: {message}")]
    Overflow { message: String },

    /// Any of the above, raised while filling a named field.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// Attach the merge field being filled when the error occurred.
    pub fn in_field(self, field: &str) -> EvalError {
        EvalError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// The underlying error with field context removed.
    pub fn root(&self) -> &EvalError {
        match self {
            EvalError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}
