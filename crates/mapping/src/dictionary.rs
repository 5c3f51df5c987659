//! Field-name keyed collections of mapping trees.

use std::collections::{BTreeMap, BTreeSet};

use crate::build::BuildError;
use crate::detail::MappingDetail;

/// Mapping trees for one template document, keyed by lower-cased field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingDictionary {
    entries: BTreeMap<String, MappingDetail>,
}

impl MappingDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Names differing only by case collide.
    pub fn insert(&mut self, name: &str, detail: MappingDetail) -> Result<(), BuildError> {
        let key = name.to_lowercase();
        if self.entries.contains_key(&key) {
            return Err(BuildError::DuplicateField {
                name: name.to_string(),
            });
        }
        self.entries.insert(key, detail);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MappingDetail> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingDetail)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The pair of dictionaries consulted for one request: per-form
/// overrides first, then the policy-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct MappingContext {
    default: MappingDictionary,
    custom: MappingDictionary,
}

impl MappingContext {
    pub fn new(default: MappingDictionary) -> Self {
        MappingContext {
            default,
            custom: MappingDictionary::new(),
        }
    }

    pub fn with_custom(mut self, custom: MappingDictionary) -> Self {
        self.custom = custom;
        self
    }

    pub fn default_dictionary(&self) -> &MappingDictionary {
        &self.default
    }

    pub fn custom_dictionary(&self) -> &MappingDictionary {
        &self.custom
    }

    /// Resolve a field name, preferring the custom dictionary.
    pub fn lookup(&self, name: &str) -> Option<&MappingDetail> {
        self.custom.get(name).or_else(|| self.default.get(name))
    }

    /// Every field name mapped by either dictionary.
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.default.names().chain(self.custom.names()).collect()
    }
}
