//! Config keys: named, ordered groups of named values.
//!
//! A key corresponds to one `[Section]` of a configuration file.  Values are
//! kept in declaration order, which is also the order a full save writes them
//! in, and are looked up by name through a side index.
//!
//! Keys come in two flavours:
//!
//! - **free-form** ([`ConfigKey::new`]): values are added and removed at will,
//!   as happens when a file is loaded without a schema;
//! - **schema-fixed** ([`ConfigKey::fixed`], usually built by
//!   [`KeyBinding`](crate::binding::KeyBinding)): the set of values is frozen,
//!   only their contents change.
//!
//! One value may be designated the *default value*.  Lines in the section
//! that carry no `name=` prefix are routed to it.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use crate::error::ConfigError;
use crate::value::{ConfigValue, ErasedValue, NamedValue};

/// A named, ordered set of named values.
#[derive(Debug, Clone)]
pub struct ConfigKey {
    name: String,
    values: Vec<Box<dyn ErasedValue>>,
    index: HashMap<String, usize>,
    default_value_name: Option<String>,
    fixed: bool,
}

impl ConfigKey {
    /// Creates an empty free-form key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Argument`] if `name` is empty or blank.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::Argument("key name must not be empty".to_string()));
        }
        Ok(Self {
            name,
            values: Vec::new(),
            index: HashMap::new(),
            default_value_name: None,
            fixed: false,
        })
    }

    /// Creates a schema-fixed key holding `values`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateValue`] if two values share a name and
    /// [`ConfigError::ValueNotFound`] if `default_value_name` names none of them.
    pub fn fixed(
        name: impl Into<String>,
        values: Vec<Box<dyn ErasedValue>>,
        default_value_name: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut key = Self::new(name)?;
        for value in values {
            key.insert_boxed(value)?;
        }
        key.set_default_value_name(default_value_name)?;
        key.fixed = true;
        Ok(key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` for schema-fixed keys.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Number of named values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the value that absorbs positional lines, if any.
    pub fn default_value_name(&self) -> Option<&str> {
        self.default_value_name.as_deref()
    }

    /// Designates the value that absorbs positional lines.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueNotFound`] if `name` is not a value of
    /// this key; the previous designation is kept.
    pub fn set_default_value_name(&mut self, name: Option<&str>) -> Result<(), ConfigError> {
        if let Some(name) = name {
            if !self.contains_value(name) {
                return Err(self.not_found(name));
            }
        }
        self.default_value_name = name.map(str::to_owned);
        Ok(())
    }

    /// Builder form of [`set_default_value_name`](Self::set_default_value_name).
    pub fn with_default_value_name(mut self, name: &str) -> Result<Self, ConfigError> {
        self.set_default_value_name(Some(name))?;
        Ok(self)
    }

    /// The default value itself.
    pub fn default_value(&self) -> Option<&dyn ErasedValue> {
        self.default_value_name.as_deref().and_then(|name| self.value(name))
    }

    pub fn default_value_mut(&mut self) -> Option<&mut (dyn ErasedValue + 'static)> {
        let name = self.default_value_name.clone()?;
        self.value_mut(&name)
    }

    /// Adds a value read by the default parser.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateValue`] if `name` already exists and
    /// [`ConfigError::FixedSchema`] on schema-fixed keys.
    pub fn add<T: ConfigValue>(
        &mut self,
        name: impl Into<String>,
        value: T,
        name_visible: bool,
    ) -> Result<(), ConfigError> {
        self.insert(NamedValue::with_value(name, value).name_visible(name_visible))
    }

    /// Adds a fully configured named value (custom parser, unset default).
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn insert<T: ConfigValue>(&mut self, value: NamedValue<T>) -> Result<(), ConfigError> {
        self.ensure_free_form()?;
        self.insert_boxed(Box::new(value))
    }

    /// Adds `value` under `name`, or replaces the existing value of that name.
    ///
    /// When `throw_on_type_change` is set and the stored value has a different
    /// type, the update is refused with [`ConfigError::TypeConflict`].
    /// Schema-fixed keys only accept same-typed updates of existing values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Argument`] for an empty name, [`ConfigError::TypeConflict`],
    /// and [`ConfigError::FixedSchema`].
    pub fn add_or_update<T: ConfigValue>(
        &mut self,
        name: &str,
        value: T,
        throw_on_type_change: bool,
        name_visible: bool,
    ) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::Argument("value name must not be empty".to_string()));
        }

        let Some(&position) = self.index.get(name) else {
            return self.add(name, value, name_visible);
        };

        let existing = &self.values[position];
        let same_type = existing.value_type_id() == TypeId::of::<T>();
        if !same_type && (throw_on_type_change || self.fixed) {
            return Err(ConfigError::TypeConflict {
                name: name.to_string(),
                existing: existing.type_name(),
                requested: type_name::<T>(),
            });
        }

        if self.fixed {
            let slot = &mut self.values[position];
            slot.set_name_visible(name_visible);
            if let Some(typed) = slot.as_any_mut().downcast_mut::<NamedValue<T>>() {
                typed.set_value(value);
            }
            return Ok(());
        }

        self.values[position] = Box::new(NamedValue::with_value(name, value).name_visible(name_visible));
        Ok(())
    }

    /// Assigns the primary slot of an existing value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ValueNotFound`] or [`ConfigError::TypeConflict`].
    pub fn set_value<T: ConfigValue>(&mut self, name: &str, value: T) -> Result<(), ConfigError> {
        let Some(&position) = self.index.get(name) else {
            return Err(self.not_found(name));
        };
        let slot = &mut self.values[position];
        let existing = slot.type_name();
        match slot.as_any_mut().downcast_mut::<NamedValue<T>>() {
            Some(typed) => {
                typed.set_value(value);
                Ok(())
            }
            None => Err(ConfigError::TypeConflict {
                name: name.to_string(),
                existing,
                requested: type_name::<T>(),
            }),
        }
    }

    /// Removes a value.  Returns `None` if no value had that name.
    ///
    /// Removing the default value clears the default value name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FixedSchema`] on schema-fixed keys.
    pub fn remove(&mut self, name: &str) -> Result<Option<Box<dyn ErasedValue>>, ConfigError> {
        self.ensure_free_form()?;
        let Some(position) = self.index.remove(name) else {
            return Ok(None);
        };
        let removed = self.values.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        if self.default_value_name.as_deref() == Some(name) {
            self.default_value_name = None;
        }
        Ok(Some(removed))
    }

    pub fn contains_value(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Erased access to a value.
    pub fn value(&self, name: &str) -> Option<&dyn ErasedValue> {
        let position = *self.index.get(name)?;
        Some(self.values[position].as_ref())
    }

    pub fn value_mut(&mut self, name: &str) -> Option<&mut (dyn ErasedValue + 'static)> {
        let position = *self.index.get(name)?;
        Some(self.values[position].as_mut())
    }

    /// Typed access to a value; `None` if missing or of another type.
    pub fn named<T: ConfigValue>(&self, name: &str) -> Option<&NamedValue<T>> {
        self.value(name)?.as_any().downcast_ref::<NamedValue<T>>()
    }

    pub fn named_mut<T: ConfigValue>(&mut self, name: &str) -> Option<&mut NamedValue<T>> {
        self.value_mut(name)?.as_any_mut().downcast_mut::<NamedValue<T>>()
    }

    /// Rendered primary entry of `name`.  Null renders as the empty string.
    /// Never fails: a missing value yields `None`.
    pub fn try_get_value(&self, name: &str) -> Option<String> {
        self.value(name).map(|v| v.primary_string().unwrap_or_default())
    }

    /// Clone of the primary entry of `name` as a `T`.  Never fails: a missing
    /// value or a value of another type yields `None`.
    pub fn try_get_value_as<T: ConfigValue>(&self, name: &str) -> Option<T> {
        self.named::<T>(name).map(|v| v.value().clone())
    }

    /// Values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedValue> + '_ {
        self.values.iter().map(|v| {
            let value: &dyn ErasedValue = v.as_ref();
            value
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|v| v.name())
    }

    fn insert_boxed(&mut self, value: Box<dyn ErasedValue>) -> Result<(), ConfigError> {
        let name = value.name().to_string();
        if name.trim().is_empty() {
            return Err(ConfigError::Argument("value name must not be empty".to_string()));
        }
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateValue {
                key: self.name.clone(),
                value: name,
            });
        }
        self.index.insert(name, self.values.len());
        self.values.push(value);
        Ok(())
    }

    fn ensure_free_form(&self) -> Result<(), ConfigError> {
        if self.fixed {
            Err(ConfigError::FixedSchema(self.name.clone()))
        } else {
            Ok(())
        }
    }

    fn not_found(&self, name: &str) -> ConfigError {
        ConfigError::ValueNotFound {
            key: self.name.clone(),
            value: name.to_string(),
        }
    }
}
