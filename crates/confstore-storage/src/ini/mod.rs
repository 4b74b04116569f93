//! Line-oriented, section-based INI storage.

mod atomic;
mod line;
mod provider;
mod writer;

pub use provider::IniStorageProvider;
pub use writer::to_ini_string;
