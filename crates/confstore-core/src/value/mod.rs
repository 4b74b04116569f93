//! Named values and the parsers that fill them.

pub mod named;
pub mod parser;

pub use named::{ConfigValue, ErasedValue, NamedValue};
pub use parser::{ConfigEnum, DefaultParser, EnumParser, FnParser, OptionalParser, Parser, TypeTag};
