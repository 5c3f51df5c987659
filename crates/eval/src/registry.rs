//! Custom Function Registry.
//!
//! Form-specific logic that does not fit the built-ins is registered here
//! by name and dispatched when a mapping node carries `hasFunction`. A
//! handler receives the typed object, the document sink and the named
//! parameter bag collected from the node's immediate `params`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::sink::DocumentSink;
use crate::value::Value;

/// Named parameters: lowercase `format`, `constant`, `field` keys.
pub type NamedParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    #[error("custom function '{name}' is not registered")]
    NotRegistered { name: String },

    #[error("custom function '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// A handler for one custom function.
///
/// Returning `Ok(None)` means the handler wrote to the sink itself and
/// has no value for the field.
pub trait CustomFunction<T: ?Sized> {
    fn invoke(
        &self,
        object: &T,
        sink: &mut dyn DocumentSink,
        params: &NamedParams,
    ) -> Result<Option<Value>, FunctionError>;
}

impl<T, F> CustomFunction<T> for F
where
    T: ?Sized,
    F: Fn(&T, &mut dyn DocumentSink, &NamedParams) -> Result<Option<Value>, FunctionError>,
{
    fn invoke(
        &self,
        object: &T,
        sink: &mut dyn DocumentSink,
        params: &NamedParams,
    ) -> Result<Option<Value>, FunctionError> {
        self(object, sink, params)
    }
}

/// Name-keyed handlers; lookup ignores case.
pub struct FunctionRegistry<T: ?Sized> {
    functions: HashMap<String, Box<dyn CustomFunction<T>>>,
}

impl<T: ?Sized> FunctionRegistry<T> {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Register a closure. A later registration under the same name wins.
    pub fn register<F>(&mut self, name: &str, function: F) -> &mut Self
    where
        F: Fn(&T, &mut dyn DocumentSink, &NamedParams) -> Result<Option<Value>, FunctionError>
            + 'static,
    {
        self.register_function(name, Box::new(function))
    }

    pub fn register_function(
        &mut self,
        name: &str,
        function: Box<dyn CustomFunction<T>>,
    ) -> &mut Self {
        let key = name.trim().to_lowercase();
        if self.functions.insert(key, function).is_some() {
            tracing::debug!(name, "custom function replaced");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.trim().to_lowercase())
    }

    /// Registered names, lowercased and sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn invoke(
        &self,
        name: &str,
        object: &T,
        sink: &mut dyn DocumentSink,
        params: &NamedParams,
    ) -> Result<Option<Value>, FunctionError> {
        let function = self
            .functions
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| FunctionError::NotRegistered {
                name: name.to_string(),
            })?;
        function.invoke(object, sink, params)
    }
}

impl<T: ?Sized> Default for FunctionRegistry<T> {
    fn default() -> Self {
        FunctionRegistry::new()
    }
}

impl<T: ?Sized> fmt::Debug for FunctionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
