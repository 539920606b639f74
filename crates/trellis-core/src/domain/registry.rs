//! Insertion-ordered name registry
//!
//! Flows, ingestion feeds and signal histories are looked up by name but
//! enumerated in the order names were first registered.

use std::collections::HashMap;

/// Map from name to value that iterates in first-insertion order
#[derive(Debug, Clone)]
pub struct OrderedRegistry<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> OrderedRegistry<V> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or overwrite; an overwritten name keeps its original position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Mutable lookup, inserting `default()` when absent
    pub fn get_or_insert_with(&mut self, name: &str, default: impl FnOnce() -> V) -> &mut V {
        let pos = match self.index.get(name) {
            Some(&pos) => pos,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in registration order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<V> Default for OrderedRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
