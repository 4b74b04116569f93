//! # confstore-storage
//!
//! Storage providers for [`confstore_core`] configurations.
//!
//! The [`StorageProvider`] trait describes the operations every backing
//! store offers: free-form load, schema-directed load, format-preserving
//! update, and full save.  [`IniStorageProvider`] implements it for
//! line-oriented INI files:
//!
//! ```no_run
//! use confstore_storage::{IniStorageProvider, StorageProvider};
//!
//! # fn main() -> Result<(), confstore_storage::StorageError> {
//! let mut provider = IniStorageProvider::open("app.ini", false)?;
//! let mut configuration = provider.load()?;
//! if let Some(server) = configuration.key_mut("Server") {
//!     server.set_value("Port", "9090".to_string())?;
//! }
//! provider.update(&configuration)?;
//! # Ok(())
//! # }
//! ```
//!
//! Writes never modify the target in place: the replacement is staged in a
//! temp file and swapped over the target once complete.
//!
//! [`SchemaStore`] connects the provider to typed structs declared with
//! [`confstore_core::KeyBinding`].

pub mod error;
pub mod format;
pub mod ini;
pub mod provider;
pub mod schema;

pub use error::StorageError;
pub use format::IniFormat;
pub use ini::{to_ini_string, IniStorageProvider};
pub use provider::StorageProvider;
pub use schema::SchemaStore;
