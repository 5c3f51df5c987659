//! Where merged values go.
//!
//! The evaluator itself only returns strings; the merge driver and custom
//! functions write through a [`DocumentSink`]. Custom functions may do
//! more than fill a field: remove one, or emit table rows.

use std::collections::{BTreeMap, BTreeSet};

pub trait DocumentSink {
    fn set_field(&mut self, name: &str, value: &str);
    fn remove_field(&mut self, name: &str);
    fn insert_rows(&mut self, table: &str, rows: Vec<Vec<String>>);
}

/// Collects everything in memory, keyed by lowercased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    fields: BTreeMap<String, String>,
    removed: BTreeSet<String>,
    tables: BTreeMap<String, Vec<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.contains(&name.to_lowercase())
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    pub fn rows(&self, table: &str) -> &[Vec<String>] {
        self.tables
            .get(&table.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl DocumentSink for MemorySink {
    fn set_field(&mut self, name: &str, value: &str) {
        let key = name.to_lowercase();
        self.removed.remove(&key);
        self.fields.insert(key, value.to_string());
    }

    fn remove_field(&mut self, name: &str) {
        let key = name.to_lowercase();
        self.fields.remove(&key);
        self.removed.insert(key);
    }

    fn insert_rows(&mut self, table: &str, rows: Vec<Vec<String>>) {
        self.tables
            .entry(table.to_lowercase())
            .or_default()
            .extend(rows);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DocumentSink for NullSink {
    fn set_field(&mut self, _name: &str, _value: &str) {}
    fn remove_field(&mut self, _name: &str) {}
    fn insert_rows(&mut self, _table: &str, _rows: Vec<Vec<String>>) {}
}
