//! Options controlling the INI line format.
//!
//! The defaults describe the classic format:
//!
//! ```text
//! # comment
//! [Section]
//! name=value
//! positional value
//! ```
//!
//! Options can be embedded in an application's own TOML configuration:
//!
//! ```toml
//! comment_prefixes = ["#", ";"]
//! separator = ":"
//! temp_dir = "/var/tmp"
//! ```
//!
//! Fields annotated with `#[serde(default = "...")]` fall back to the classic
//! format when absent, so an empty document yields [`IniFormat::default`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Line format of an INI file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniFormat {
    /// A trimmed line starting with any of these is a comment.
    #[serde(default = "default_comment_prefixes")]
    pub comment_prefixes: Vec<String>,
    /// Separates a value's name from its literal.
    #[serde(default = "default_separator")]
    pub separator: char,
    /// Prefix of the hidden names given to positional lines on a free-form load.
    #[serde(default = "default_unnamed_prefix")]
    pub unnamed_prefix: String,
    /// Where replacement files are staged.  `None` stages next to the target,
    /// which keeps the final rename on one volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_comment_prefixes() -> Vec<String> {
    vec!["#".to_string()]
}
fn default_separator() -> char {
    '='
}
fn default_unnamed_prefix() -> String {
    "unnamed".to_string()
}

impl Default for IniFormat {
    fn default() -> Self {
        Self {
            comment_prefixes: default_comment_prefixes(),
            separator: default_separator(),
            unnamed_prefix: default_unnamed_prefix(),
            temp_dir: None,
        }
    }
}

impl IniFormat {
    /// Parses and validates options from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Options`] for malformed TOML and
    /// [`StorageError::InvalidOperation`] for options that fail
    /// [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self, StorageError> {
        let format: IniFormat = toml::from_str(text)?;
        format.validate()?;
        Ok(format)
    }

    /// Checks that the options describe an unambiguous format.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidOperation`] naming the offending option.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.comment_prefixes.is_empty() {
            return Err(invalid("at least one comment prefix is required"));
        }
        if self.comment_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("comment prefixes must not be blank"));
        }
        if matches!(self.separator, '[' | ']') || self.separator.is_whitespace() {
            return Err(invalid("separator must not be a bracket or whitespace"));
        }
        if self.unnamed_prefix.trim().is_empty() {
            return Err(invalid("unnamed prefix must not be blank"));
        }
        Ok(())
    }

    /// Whether an already-trimmed line is a comment.
    pub fn is_comment(&self, trimmed: &str) -> bool {
        self.comment_prefixes.iter().any(|p| trimmed.starts_with(p.as_str()))
    }

    /// Hidden name of the `index`-th positional line of a free-form load.
    pub fn unnamed(&self, index: usize) -> String {
        format!("{}{index}", self.unnamed_prefix)
    }
}

fn invalid(reason: &str) -> StorageError {
    StorageError::InvalidOperation(format!("invalid INI format: {reason}"))
}
