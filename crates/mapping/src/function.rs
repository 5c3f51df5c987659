//! Catalogue of built-in mapping functions.
//!
//! This is the single list of names the builder treats as built-in. Any
//! other function name in a template is a custom function and is
//! dispatched by name at evaluation time.

use std::fmt;

/// A function with fixed semantics interpreted by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sum,
    Concat,
    Join,
    JoinArray,
    IfTrue,
    IfNull,
    IfNotNull,
    IfNotEqual,
    IfNotNullEmptyWhitespace,
    And,
    Or,
    Contains,
    StringFormat,
    Division,
    Condition,
}

const ALL: [Builtin; 15] = [
    Builtin::Sum,
    Builtin::Concat,
    Builtin::Join,
    Builtin::JoinArray,
    Builtin::IfTrue,
    Builtin::IfNull,
    Builtin::IfNotNull,
    Builtin::IfNotEqual,
    Builtin::IfNotNullEmptyWhitespace,
    Builtin::And,
    Builtin::Or,
    Builtin::Contains,
    Builtin::StringFormat,
    Builtin::Division,
    Builtin::Condition,
];

impl Builtin {
    /// Look up a built-in by name, ignoring ASCII case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Builtin> {
        let name = name.trim();
        ALL.iter().copied().find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sum => "SUM",
            Builtin::Concat => "CONCAT",
            Builtin::Join => "JOIN",
            Builtin::JoinArray => "JOINARRAY",
            Builtin::IfTrue => "IFTRUE",
            Builtin::IfNull => "IFNULL",
            Builtin::IfNotNull => "IFNOTNULL",
            Builtin::IfNotEqual => "IFNOTEQUAL",
            Builtin::IfNotNullEmptyWhitespace => "IFNOTNULLEMPTYWHITESPACE",
            Builtin::And => "AND",
            Builtin::Or => "OR",
            Builtin::Contains => "CONTAINS",
            Builtin::StringFormat => "STRINGFORMAT",
            Builtin::Division => "DIVISION",
            Builtin::Condition => "CONDITION",
        }
    }

    /// All built-ins in catalogue order.
    pub fn all() -> impl Iterator<Item = Builtin> {
        ALL.into_iter()
    }

    /// Parameter count the builder enforces, if any.
    ///
    /// STRINGFORMAT, IFNOTNULL and CONDITION are not arity-checked; the
    /// evaluator treats their missing parameters as empty.
    pub fn arity(self) -> Option<Arity> {
        match self {
            Builtin::And | Builtin::Or => Some(Arity::AtLeast(3)),
            Builtin::IfNotEqual | Builtin::Contains => Some(Arity::Exactly(4)),
            Builtin::IfTrue | Builtin::IfNull | Builtin::IfNotNullEmptyWhitespace => {
                Some(Arity::Exactly(3))
            }
            Builtin::Division => Some(Arity::Exactly(2)),
            Builtin::Join | Builtin::JoinArray => Some(Arity::AtLeast(2)),
            Builtin::Concat | Builtin::Sum => Some(Arity::AtLeast(1)),
            Builtin::StringFormat | Builtin::IfNotNull | Builtin::Condition => None,
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Required parameter count of a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}
