use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Spelling from the defining line.
    pub name: String,
    pub address: u32,
}

/// Label -> address map. Names compare case-insensitively and the first
/// definition of a name is the one kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: BTreeMap<String, Symbol>,
}

fn key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name`, unless it already exists. On collision the table is
    /// left untouched and the existing address is returned.
    pub fn try_insert(&mut self, name: &str, address: u32) -> Option<u32> {
        let k = key(name);
        if let Some(prev) = self.entries.get(&k) {
            return Some(prev.address);
        }
        self.entries.insert(k, Symbol { name: name.trim().to_string(), address });
        None
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(&key(name)).map(|s| s.address)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values()
    }

    /// Symbols ordered by address, then name.
    pub fn by_address(&self) -> Vec<&Symbol> {
        let mut v: Vec<&Symbol> = self.entries.values().collect();
        v.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
        v
    }
}
