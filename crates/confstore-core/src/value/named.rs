//! Typed, named, ordered multi-value slots.
//!
//! A [`NamedValue`] always holds at least one entry.  The first entry is the
//! *primary* slot; [`NamedValue::value`] reads it.  Until the primary slot
//! has been explicitly assigned, [`ErasedValue::add_parsed_string`] fills it
//! instead of appending, so repeated positional lines accumulate into an
//! ordered sequence starting at index 0.
//!
//! Keys store values of different types side by side, so storage code works
//! through the object-safe [`ErasedValue`] view and only typed callers touch
//! `NamedValue<T>` directly.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use super::parser::{DefaultParser, Parser, TypeTag};
use crate::error::ConfigError;

/// A type that can live inside a [`NamedValue`].
pub trait ConfigValue: Clone + fmt::Debug + Send + Sync + 'static {
    /// Renders the value for configuration text.  `None` means null.
    fn to_config_string(&self) -> Option<String>;
}

macro_rules! display_config_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl ConfigValue for $t {
                fn to_config_string(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_config_value!(
    bool, u8, i8, char, Decimal, f64, f32, i32, u32, i64, u64, i16, u16, String, Url, Uuid, TypeTag,
);

impl ConfigValue for DateTime<FixedOffset> {
    fn to_config_string(&self) -> Option<String> {
        Some(self.to_rfc3339())
    }
}

impl ConfigValue for NaiveDateTime {
    fn to_config_string(&self) -> Option<String> {
        Some(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }
}

impl<T: ConfigValue> ConfigValue for Option<T> {
    fn to_config_string(&self) -> Option<String> {
        self.as_ref().and_then(T::to_config_string)
    }
}

/// Type-erased view of a [`NamedValue`].
pub trait ErasedValue: fmt::Debug + Send + Sync {
    /// The value's name.  Never changes after construction.
    fn name(&self) -> &str;

    /// Whether serialization writes `name=` before the literal.
    fn is_name_visible(&self) -> bool;

    fn set_name_visible(&mut self, visible: bool);

    /// Whether the primary slot has been explicitly assigned.
    fn is_value_set(&self) -> bool;

    /// Number of entries, including an unassigned primary slot.
    fn len(&self) -> usize;

    /// Name of the declared Rust type.
    fn type_name(&self) -> &'static str;

    /// [`TypeId`] of the declared Rust type.
    fn value_type_id(&self) -> TypeId;

    /// Parses `input` and overwrites the primary slot.
    ///
    /// # Errors
    ///
    /// Propagates the parser's error; the value is left unchanged.
    fn parse_string(&mut self, input: &str) -> Result<(), ConfigError>;

    /// Parses `input` and fills the primary slot if it is unset, otherwise
    /// appends a new entry.
    ///
    /// # Errors
    ///
    /// Propagates the parser's error; the value is left unchanged.
    fn add_parsed_string(&mut self, input: &str) -> Result<(), ConfigError>;

    /// Truncates to a single slot holding the declared default and clears
    /// the "set" flag.
    fn reset_value(&mut self);

    /// Rendered primary entry; `None` for null.
    fn primary_string(&self) -> Option<String>;

    /// Rendered entries that were actually assigned, in order.  Empty when
    /// the primary slot was never set.
    fn stored_strings(&self) -> Vec<Option<String>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_boxed(&self) -> Box<dyn ErasedValue>;
}

impl Clone for Box<dyn ErasedValue> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// A typed, named, ordered multi-value slot.
pub struct NamedValue<T: ConfigValue> {
    name: String,
    values: Vec<T>,
    declared: T,
    is_value_set: bool,
    is_name_visible: bool,
    parser: Arc<dyn Parser<T>>,
}

impl<T: ConfigValue> NamedValue<T> {
    /// Declares a value whose primary slot holds `default` and is not yet set.
    ///
    /// The value uses the [`DefaultParser`]; declaring a type the default
    /// parser cannot read is allowed, but parsing into it fails with
    /// [`ConfigError::UnsupportedType`] unless [`with_parser`](Self::with_parser)
    /// supplies another parser.
    pub fn new(name: impl Into<String>, default: T) -> Self {
        Self {
            name: name.into(),
            values: vec![default.clone()],
            declared: default,
            is_value_set: false,
            is_name_visible: true,
            parser: Arc::new(DefaultParser),
        }
    }

    /// Declares a value whose primary slot is assigned `value`.
    pub fn with_value(name: impl Into<String>, value: T) -> Self {
        let mut named = Self::new(name, value);
        named.is_value_set = true;
        named
    }

    /// Replaces the parser.
    pub fn with_parser(mut self, parser: impl Parser<T> + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Replaces the parser with one shared across values.
    pub fn with_shared_parser(mut self, parser: Arc<dyn Parser<T>>) -> Self {
        self.parser = parser;
        self
    }

    /// Sets whether the name is written on serialization.
    pub fn name_visible(mut self, visible: bool) -> Self {
        self.is_name_visible = visible;
        self
    }

    /// The primary entry.
    pub fn value(&self) -> &T {
        &self.values[0]
    }

    /// All entries, primary first.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The value the slot was declared with.
    pub fn declared(&self) -> &T {
        &self.declared
    }

    /// Assigns the primary slot.
    pub fn set_value(&mut self, value: T) {
        self.values[0] = value;
        self.is_value_set = true;
    }

    /// Appends `value`, or fills the primary slot if it is still unset.
    pub fn add_value(&mut self, value: T) {
        if self.is_value_set {
            self.values.push(value);
        } else {
            self.set_value(value);
        }
    }

    /// Replaces all entries.  An empty `values` resets the slot.
    pub fn set_values(&mut self, values: impl IntoIterator<Item = T>) {
        self.reset_value();
        for value in values {
            self.add_value(value);
        }
    }

    fn parse(&self, input: &str) -> Result<T, ConfigError> {
        self.parser.parse(Some(input))
    }
}

impl<T: ConfigValue> Clone for NamedValue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.clone(),
            declared: self.declared.clone(),
            is_value_set: self.is_value_set,
            is_name_visible: self.is_name_visible,
            parser: Arc::clone(&self.parser),
        }
    }
}

impl<T: ConfigValue> fmt::Debug for NamedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedValue")
            .field("name", &self.name)
            .field("values", &self.values)
            .field("is_value_set", &self.is_value_set)
            .field("is_name_visible", &self.is_name_visible)
            .finish_non_exhaustive()
    }
}

impl<T: ConfigValue> ErasedValue for NamedValue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_name_visible(&self) -> bool {
        self.is_name_visible
    }

    fn set_name_visible(&mut self, visible: bool) {
        self.is_name_visible = visible;
    }

    fn is_value_set(&self) -> bool {
        self.is_value_set
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn parse_string(&mut self, input: &str) -> Result<(), ConfigError> {
        let parsed = self.parse(input)?;
        self.set_value(parsed);
        Ok(())
    }

    fn add_parsed_string(&mut self, input: &str) -> Result<(), ConfigError> {
        let parsed = self.parse(input)?;
        self.add_value(parsed);
        Ok(())
    }

    fn reset_value(&mut self) {
        self.values.clear();
        self.values.push(self.declared.clone());
        self.is_value_set = false;
    }

    fn primary_string(&self) -> Option<String> {
        self.values[0].to_config_string()
    }

    fn stored_strings(&self) -> Vec<Option<String>> {
        if !self.is_value_set {
            return Vec::new();
        }
        self.values.iter().map(ConfigValue::to_config_string).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedValue> {
        Box::new(self.clone())
    }
}
