//! A simple named-database mapping over independent [`ForwardingStore`]s.
//!
//! No algorithmic content of its own: this exists so a caller (e.g. a
//! command interpreter's `NEW`/`DEL <id>` handling) has somewhere to
//! keep more than one store without re-deriving a `HashMap` wrapper.

use std::collections::HashMap;

use crate::store::ForwardingStore;

#[derive(Debug, Default)]
pub struct Registry {
    databases: HashMap<String, ForwardingStore>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named database, creating an empty one if it doesn't exist
    /// yet. An existing database is re-selected, not treated as an error.
    pub fn select_or_create(&mut self, name: &str) -> &mut ForwardingStore {
        self.databases
            .entry(name.to_string())
            .or_insert_with(ForwardingStore::new)
    }

    /// Removes the named database. Returns `false` if it didn't exist.
    pub fn delete(&mut self, name: &str) -> bool {
        self.databases.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ForwardingStore> {
        self.databases.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }
}
