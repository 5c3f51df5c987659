//! policydoc-mapping: the field-mapping template model.
//!
//! A mapping template is a JSON object whose keys are merge-field
//! (bookmark) names and whose values are nested directive objects:
//!
//! ```json
//! {"TotalPremium": {"function": "SUM", "format": "{0:C0}", "params": [
//!     {"jsonPath": "$.Coverages[*].Premium"},
//!     {"field": "Policy.Fees"}
//! ]}}
//! ```
//!
//! [`build`] turns such a template into a [`MappingDictionary`] of
//! [`MappingDetail`] trees, rejecting built-in functions called with the
//! wrong number of parameters before any document is touched. Evaluating
//! the trees is the job of `policydoc-eval`.

pub mod build;
pub mod detail;
pub mod dictionary;
pub mod function;

pub use build::{build, build_str, BuildError};
pub use detail::MappingDetail;
pub use dictionary::{MappingContext, MappingDictionary};
pub use function::{Arity, Builtin};
