//! Loading and storing typed structs through a storage provider.
//!
//! A [`SchemaStore<S>`] groups the [`KeyBinding`]s describing a struct `S`.
//! Loading builds a schema configuration from the struct's current values,
//! lets the provider fill it, and writes the results back through the
//! bindings.  Fields absent from storage keep their current value.

use confstore_core::{Configuration, KeyBinding};
use tracing::debug;

use crate::error::StorageError;
use crate::provider::StorageProvider;

/// The key bindings of one typed configuration struct.
#[derive(Debug)]
pub struct SchemaStore<S> {
    bindings: Vec<KeyBinding<S>>,
}

impl<S> Default for SchemaStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SchemaStore<S> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Adds a key binding.  Keys are laid out in binding order.
    pub fn bind(mut self, binding: KeyBinding<S>) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Builds the schema configuration from the current values of `source`.
    ///
    /// # Errors
    ///
    /// [`StorageError::Config`] if two bindings share a key name or a binding
    /// cannot build its key.
    pub fn schema(&self, source: &S) -> Result<Configuration, StorageError> {
        let keys = self
            .bindings
            .iter()
            .map(|binding| binding.to_key(source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Configuration::from_keys(keys)?)
    }

    /// Fills `target` from `provider`.
    ///
    /// Either every binding is applied or `target` is left as it was.
    ///
    /// # Errors
    ///
    /// Propagates provider failures, and [`StorageError::Config`] if the
    /// loaded configuration no longer matches a binding.
    pub fn load<P>(&self, provider: &mut P, target: &mut S) -> Result<(), StorageError>
    where
        P: StorageProvider + ?Sized,
    {
        let mut configuration = self.schema(target)?;
        provider.load_into(&mut configuration)?;

        let mut loaded = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if let Some(key) = configuration.key(binding.name()) {
                binding.check(key)?;
                loaded.push((binding, key));
            }
        }
        for (binding, key) in loaded {
            binding.apply(key, target)?;
        }
        debug!("applied {} keys to typed configuration", self.bindings.len());
        Ok(())
    }

    /// Writes the current values of `source` to `provider`, preserving the
    /// rest of the store.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn store<P>(&self, provider: &mut P, source: &S, add_missing_keys: bool) -> Result<(), StorageError>
    where
        P: StorageProvider + ?Sized,
    {
        let configuration = self.schema(source)?;
        provider.update_with(&configuration, add_missing_keys)
    }
}
