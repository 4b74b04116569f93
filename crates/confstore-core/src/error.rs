//! Error taxonomy for the in-memory configuration model.
//!
//! Every fallible model operation returns [`ConfigError`].  Try-style lookups
//! (`try_get_value`, `Configuration::key`) return `Option` instead and never
//! produce one of these.

use thiserror::Error;

/// Errors raised by named values, config keys, and configurations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A literal could not be converted to the value's declared type.
    #[error("cannot parse {input:?} as {target}: {reason}")]
    Parse {
        /// The literal that failed to convert (`None` for a null input).
        input: Option<String>,
        /// Name of the target type.
        target: &'static str,
        /// Human-readable cause reported by the conversion.
        reason: String,
    },

    /// The declared type has no conversion in the default parser.
    #[error("unsupported value type for parsing: {0}")]
    UnsupportedType(&'static str),

    /// A key with the same name already exists in the configuration.
    #[error("a key named '{0}' already exists")]
    DuplicateKey(String),

    /// A value with the same name already exists in the key.
    #[error("key '{key}' already has a value named '{value}'")]
    DuplicateValue { key: String, value: String },

    /// An update tried to change the stored type of a value.
    #[error("value '{name}' holds {existing}, refusing to replace it with {requested}")]
    TypeConflict {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// The named value does not exist in the key.
    #[error("key '{key}' has no value named '{value}'")]
    ValueNotFound { key: String, value: String },

    /// A structural change was attempted on a schema-fixed key.
    #[error("key '{0}' has a fixed schema; values cannot be added or removed")]
    FixedSchema(String),

    /// An argument violated a precondition (empty name, rename through the
    /// name indexer, out-of-range index).
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl ConfigError {
    /// Builds a [`ConfigError::Parse`] for `input` converted to `target`.
    pub fn parse(input: Option<&str>, target: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            input: input.map(str::to_owned),
            target,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for errors caused by malformed literals.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_includes_input_and_target() {
        let err = ConfigError::parse(Some("abc"), "i32", "invalid digit found in string");

        let msg = err.to_string();

        assert!(msg.contains("\"abc\""), "message was: {msg}");
        assert!(msg.contains("i32"));
        assert!(err.is_parse());
    }

    #[test]
    fn test_duplicate_value_error_names_key_and_value() {
        let err = ConfigError::DuplicateValue {
            key: "Server".to_string(),
            value: "Port".to_string(),
        };

        assert_eq!(err.to_string(), "key 'Server' already has a value named 'Port'");
        assert!(!err.is_parse());
    }
}
