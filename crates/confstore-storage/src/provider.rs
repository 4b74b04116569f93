//! The storage provider abstraction.
//!
//! A provider moves a [`Configuration`] between memory and one backing store.
//! Providers are synchronous and not safe for concurrent use: every full scan
//! rewinds the shared backing stream, so callers serialize access to one
//! instance themselves.

use confstore_core::Configuration;

use crate::error::StorageError;

/// Reads and writes configurations to a backing store.
///
/// A provider starts out unopened, opens its store lazily on first use, and
/// ends disposed.  Once disposed, every operation fails with
/// [`StorageError::Disposed`].
#[cfg_attr(test, mockall::automock)]
pub trait StorageProvider {
    fn is_disposed(&self) -> bool;

    /// Read-only providers reject [`update`](Self::update) and
    /// [`save`](Self::save) with [`StorageError::ReadOnly`].
    fn is_read_only(&self) -> bool;

    /// Free-form load: every section and value in the store becomes a key and
    /// a string value of a new configuration.
    ///
    /// # Errors
    ///
    /// [`StorageError::Disposed`], I/O failures, and duplicate section or
    /// value names reported with their line number.
    fn load(&mut self) -> Result<Configuration, StorageError>;

    /// Schema-directed load: only keys and values already declared in
    /// `configuration` are filled; everything else in the store is ignored.
    ///
    /// # Errors
    ///
    /// [`StorageError::Disposed`], I/O failures, and literals that fail to
    /// parse into their declared type.
    fn load_into(&mut self, configuration: &mut Configuration) -> Result<(), StorageError>;

    /// Rewrites the values of `configuration` into the store, leaving
    /// everything else untouched.  Keys missing from the store are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`update_with`](Self::update_with).
    fn update(&mut self, configuration: &Configuration) -> Result<(), StorageError> {
        self.update_with(configuration, false)
    }

    /// Rewrites the values of `configuration` into the store.  With
    /// `add_missing_keys`, keys absent from the store are appended.
    ///
    /// # Errors
    ///
    /// [`StorageError::Disposed`], [`StorageError::ReadOnly`], and I/O
    /// failures.  On failure the store is left as it was.
    fn update_with(
        &mut self,
        configuration: &Configuration,
        add_missing_keys: bool,
    ) -> Result<(), StorageError>;

    /// Replaces the whole store with a dump of `configuration`.
    ///
    /// # Errors
    ///
    /// Same as [`update_with`](Self::update_with).
    fn save(&mut self, configuration: &Configuration) -> Result<(), StorageError>;

    /// Releases the backing store.  Idempotent.
    fn dispose(&mut self);
}
