//! Ordered name registries.
//!
//! Provides a contiguous index (0..N) for names in first-seen order with
//! O(1) lookup in both directions. Probe and drive lists accumulate through
//! [`NameRegistry::push_unique`], so registering the same name twice keeps
//! its original position.

use std::collections::HashMap;

use crate::error::{IcError, IcResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameRegistry {
    /// Contiguous list of names (index -> name).
    names: Vec<String>,

    /// Reverse lookup: name -> index.
    index: HashMap<String, usize>,

    /// What the names refer to, used in lookup errors.
    what: &'static str,
}

impl NameRegistry {
    /// Create an empty registry. `what` names the entries in error messages.
    pub fn new(what: &'static str) -> Self {
        Self {
            names: Vec::new(),
            index: HashMap::new(),
            what,
        }
    }

    /// Append `name` unless already present; returns its index either way.
    pub fn push_unique(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }

    /// Append every name of `names` that is not yet registered.
    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.push_unique(name);
        }
    }

    /// Index of `name`, or a not-found error.
    pub fn index_of(&self, name: &str) -> IcResult<usize> {
        self.index.get(name).copied().ok_or_else(|| IcError::NotFound {
            what: self.what,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Name at a contiguous index.
    pub fn name(&self, i: usize) -> IcResult<&str> {
        self.names
            .get(i)
            .map(String::as_str)
            .ok_or(IcError::IndexOob {
                what: self.what,
                index: i,
                len: self.names.len(),
            })
    }

    /// Names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
