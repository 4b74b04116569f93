//! Ordered, name-indexed collection of config keys.
//!
//! [`Configuration`] is one store with two access paths: by position (the
//! order keys were added, which is the order a full save writes them in) and
//! by key name.  Every mutation validates first and then updates both paths,
//! so a failed call leaves the collection unchanged.

use std::collections::HashMap;
use std::ops::Index;

use crate::error::ConfigError;
use crate::key::ConfigKey;

/// An ordered, name-indexed collection of [`ConfigKey`]s.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    keys: Vec<ConfigKey>,
    index: HashMap<String, usize>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from `keys`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKey`] if two keys share a name.
    pub fn from_keys(keys: impl IntoIterator<Item = ConfigKey>) -> Result<Self, ConfigError> {
        let mut configuration = Self::new();
        for key in keys {
            configuration.push(key)?;
        }
        Ok(configuration)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // ── Positional access ─────────────────────────────────────────────────────

    pub fn get(&self, index: usize) -> Option<&ConfigKey> {
        self.keys.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ConfigKey> {
        self.keys.get_mut(index)
    }

    /// Replaces the key at `index`, returning the previous one.
    ///
    /// The replacement may carry a different name as long as no other key
    /// already uses it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Argument`] for an out-of-range index and
    /// [`ConfigError::DuplicateKey`] for a name clash.
    pub fn set(&mut self, index: usize, key: ConfigKey) -> Result<ConfigKey, ConfigError> {
        let current = self.keys.get(index).ok_or_else(|| out_of_range(index, self.len()))?;
        let renamed = current.name() != key.name();
        if renamed && self.index.contains_key(key.name()) {
            return Err(ConfigError::DuplicateKey(key.name().to_string()));
        }
        if renamed {
            self.index.remove(current.name());
            self.index.insert(key.name().to_string(), index);
        }
        Ok(std::mem::replace(&mut self.keys[index], key))
    }

    /// Inserts `key` at `index`, shifting later keys.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Argument`] if `index > len` and
    /// [`ConfigError::DuplicateKey`] for a name clash.
    pub fn insert(&mut self, index: usize, key: ConfigKey) -> Result<(), ConfigError> {
        if index > self.keys.len() {
            return Err(out_of_range(index, self.len()));
        }
        if self.index.contains_key(key.name()) {
            return Err(ConfigError::DuplicateKey(key.name().to_string()));
        }
        self.keys.insert(index, key);
        self.reindex_from(index);
        Ok(())
    }

    /// Appends `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateKey`] if a key with the same name exists.
    pub fn push(&mut self, key: ConfigKey) -> Result<(), ConfigError> {
        if self.index.contains_key(key.name()) {
            return Err(ConfigError::DuplicateKey(key.name().to_string()));
        }
        self.index.insert(key.name().to_string(), self.keys.len());
        self.keys.push(key);
        Ok(())
    }

    /// Removes and returns the key at `index`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Argument`] for an out-of-range index.
    pub fn remove_at(&mut self, index: usize) -> Result<ConfigKey, ConfigError> {
        if index >= self.keys.len() {
            return Err(out_of_range(index, self.len()));
        }
        let removed = self.keys.remove(index);
        self.index.remove(removed.name());
        self.reindex_from(index);
        Ok(removed)
    }

    /// Position of the key named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    // ── Name access ───────────────────────────────────────────────────────────

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The key named `name`; `None` if there is none.
    pub fn key(&self, name: &str) -> Option<&ConfigKey> {
        self.index.get(name).map(|&i| &self.keys[i])
    }

    pub fn key_mut(&mut self, name: &str) -> Option<&mut ConfigKey> {
        let position = *self.index.get(name)?;
        Some(&mut self.keys[position])
    }

    /// Replaces the key named `name` in place, returning the previous one.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Argument`] if `key` carries a different name (renaming
    /// through the name path is not allowed) or no key is named `name`.
    pub fn replace(&mut self, name: &str, key: ConfigKey) -> Result<ConfigKey, ConfigError> {
        if key.name() != name {
            return Err(ConfigError::Argument(format!(
                "replacement key '{}' must keep the name '{name}'",
                key.name()
            )));
        }
        let position = self
            .index_of(name)
            .ok_or_else(|| ConfigError::Argument(format!("no key named '{name}'")))?;
        Ok(std::mem::replace(&mut self.keys[position], key))
    }

    /// Removes the key named `name`.
    pub fn remove(&mut self, name: &str) -> Option<ConfigKey> {
        let position = self.index_of(name)?;
        self.remove_at(position).ok()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.index.clear();
    }

    /// Keys in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigKey> {
        self.keys.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ConfigKey> {
        self.keys.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(ConfigKey::name)
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, key) in self.keys[start..].iter().enumerate() {
            self.index.insert(key.name().to_string(), start + offset);
        }
    }
}

fn out_of_range(index: usize, len: usize) -> ConfigError {
    ConfigError::Argument(format!("index {index} is out of range for {len} keys"))
}

impl Index<usize> for Configuration {
    type Output = ConfigKey;

    fn index(&self, index: usize) -> &ConfigKey {
        &self.keys[index]
    }
}

impl Index<&str> for Configuration {
    type Output = ConfigKey;

    /// # Panics
    ///
    /// Panics if no key is named `name`; use [`Configuration::key`] for a fallible lookup.
    fn index(&self, name: &str) -> &ConfigKey {
        match self.key(name) {
            Some(key) => key,
            None => panic!("no key named '{name}'"),
        }
    }
}

impl<'a> IntoIterator for &'a Configuration {
    type Item = &'a ConfigKey;
    type IntoIter = std::slice::Iter<'a, ConfigKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl IntoIterator for Configuration {
    type Item = ConfigKey;
    type IntoIter = std::vec::IntoIter<ConfigKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}
