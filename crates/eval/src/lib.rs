//! policydoc-eval: evaluates mapping trees into merge-field text.
//!
//! Given a [`MappingDetail`](policydoc_mapping::MappingDetail) built by
//! `policydoc-mapping`, a typed policy object and its JSON projection,
//! the [`Evaluator`] produces the string written into a document field.
//! The [`merge_fields`] driver runs it across a set of field names and
//! writes into a [`DocumentSink`].
//!
//! Numbers are `rust_decimal::Decimal` throughout; dates use `time`.

pub mod error;
pub mod evaluate;
pub mod field;
pub mod format;
pub mod merge;
pub mod numeric;
pub mod path;
pub mod registry;
pub mod sink;
pub mod value;

pub use error::EvalError;
pub use evaluate::Evaluator;
pub use field::{FieldError, FieldSource, FieldTable, Fields};
pub use format::FormatError;
pub use merge::{merge_all, merge_fields, validate_paths, MergeReport};
pub use path::{resolve, PathError, PathQuery, Resolved};
pub use registry::{CustomFunction, FunctionError, FunctionRegistry, NamedParams};
pub use sink::{DocumentSink, MemorySink, NullSink};
pub use value::Value;
