//! # confstore-core
//!
//! In-memory model for sectioned configuration files: typed named values,
//! config keys grouping them, and ordered configurations of keys.
//!
//! This crate knows nothing about files.  Storage providers (see the
//! `confstore-storage` crate) read text into this model and write it back.
//!
//! # Architecture overview (for beginners)
//!
//! A configuration file such as
//!
//! ```text
//! [Server]
//! Port=8080
//!
//! [Hosts]
//! alpha
//! beta
//! ```
//!
//! maps onto three layers:
//!
//! - **`Configuration`** – the whole file: an ordered collection of keys,
//!   reachable both by position and by name.
//!
//! - **`ConfigKey`** – one `[Section]`: an ordered collection of named values.
//!   A key may designate one value as its *default value*; lines without a
//!   `name=` prefix (`alpha`, `beta` above) accumulate there.
//!
//! - **`NamedValue<T>`** – one typed slot, holding one or more entries of `T`.
//!   Literals are turned into `T` by a [`Parser`]; the [`DefaultParser`]
//!   covers the common scalar types.
//!
//! Keys can be built ad hoc, or declared up front from a Rust struct with a
//! [`KeyBinding`], which fixes the key's schema.

pub mod binding;
pub mod configuration;
pub mod error;
pub mod key;
pub mod value;

// Re-export the most-used types at the crate root so callers can write
// `confstore_core::ConfigKey` instead of `confstore_core::key::ConfigKey`.
pub use binding::{Conversion, KeyBinding};
pub use configuration::Configuration;
pub use error::ConfigError;
pub use key::ConfigKey;
pub use value::{
    ConfigEnum, ConfigValue, DefaultParser, EnumParser, ErasedValue, FnParser, NamedValue,
    OptionalParser, Parser, TypeTag,
};
