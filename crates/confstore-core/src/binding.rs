//! Declarative binding between a typed struct and a schema-fixed key.
//!
//! A [`KeyBinding<S>`] is registered once, at startup, and describes how the
//! fields of `S` map onto the named values of one config key: the configured
//! name, how to read and write the field, which parser reads its literals,
//! whether the name is written to storage, and what literal stands in for a
//! missing optional value.
//!
//! ```rust
//! use confstore_core::binding::KeyBinding;
//!
//! #[derive(Default)]
//! struct Server { port: u16, hosts: Vec<String> }
//!
//! let binding = KeyBinding::<Server>::new("Server")
//!     .field("Port", |s| s.port, |s, v| s.port = v)
//!     .positional("hosts", |s| s.hosts.clone(), |s, v| s.hosts = v);
//!
//! let mut server = Server { port: 8080, ..Server::default() };
//! let mut key = binding.to_key(&server).unwrap();
//! key.set_value("Port", 9090u16).unwrap();
//! binding.apply(&key, &mut server).unwrap();
//! assert_eq!(server.port, 9090);
//! ```

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::key::ConfigKey;
use crate::value::{ConfigValue, DefaultParser, ErasedValue, FnParser, NamedValue, Parser};

/// A bidirectional conversion applied between a field's type `C` and the
/// stored type `T`.
///
/// The forward direction runs when a key is built from the struct, the
/// backward direction when loaded values are written back.
pub struct Conversion<C, T> {
    forward: Arc<dyn Fn(&C) -> T>,
    backward: Arc<dyn Fn(T) -> C>,
}

impl<C, T> Conversion<C, T> {
    pub fn new(forward: impl Fn(&C) -> T + 'static, backward: impl Fn(T) -> C + 'static) -> Self {
        Self {
            forward: Arc::new(forward),
            backward: Arc::new(backward),
        }
    }

    pub fn forward(&self, value: &C) -> T {
        (self.forward)(value)
    }

    pub fn backward(&self, value: T) -> C {
        (self.backward)(value)
    }
}

impl<C, T> Clone for Conversion<C, T> {
    fn clone(&self) -> Self {
        Self {
            forward: Arc::clone(&self.forward),
            backward: Arc::clone(&self.backward),
        }
    }
}

type BuildFn<S> = Box<dyn Fn(&S) -> Result<Box<dyn ErasedValue>, ConfigError>>;
type ApplyFn<S> = Box<dyn Fn(&dyn ErasedValue, &mut S) -> Result<(), ConfigError>>;

struct FieldBinding<S> {
    config_name: String,
    visible: bool,
    stored_type: (TypeId, &'static str),
    build: BuildFn<S>,
    apply: ApplyFn<S>,
}

/// Maps the fields of `S` onto a schema-fixed [`ConfigKey`].
pub struct KeyBinding<S> {
    name: String,
    default_value_name: Option<String>,
    fields: Vec<FieldBinding<S>>,
}

impl<S> fmt::Debug for KeyBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("name", &self.name)
            .field("default_value_name", &self.default_value_name)
            .field(
                "fields",
                &self.fields.iter().map(|b| b.config_name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<S> KeyBinding<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value_name: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value_name(&self) -> Option<&str> {
        self.default_value_name.as_deref()
    }

    /// Configured names, in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|b| b.config_name.as_str())
    }

    /// Binds a scalar field read by the default parser.
    pub fn field<T: ConfigValue>(
        self,
        name: impl Into<String>,
        get: impl Fn(&S) -> T + 'static,
        set: impl Fn(&mut S, T) + 'static,
    ) -> Self {
        self.field_with(name, get, set, DefaultParser)
    }

    /// Binds a scalar field read by `parser`.
    pub fn field_with<T: ConfigValue>(
        self,
        name: impl Into<String>,
        get: impl Fn(&S) -> T + 'static,
        set: impl Fn(&mut S, T) + 'static,
        parser: impl Parser<T> + 'static,
    ) -> Self {
        let name = name.into();
        let parser: Arc<dyn Parser<T>> = Arc::new(parser);
        let value_name = name.clone();
        let build: BuildFn<S> = Box::new(move |source| {
            let value = NamedValue::with_value(value_name.clone(), get(source))
                .with_shared_parser(Arc::clone(&parser));
            Ok(Box::new(value) as Box<dyn ErasedValue>)
        });
        let apply: ApplyFn<S> = Box::new(move |stored, target| {
            let typed = downcast::<T>(stored)?;
            if typed.is_value_set() {
                set(target, typed.value().clone());
            }
            Ok(())
        });
        self.push(name, stored::<T>(), build, apply)
    }

    /// Binds an optional field.  When the field is `None`, the stored value is
    /// `null_literal` parsed as `T`, or null if no literal is given.
    ///
    /// A blank literal reads back as `None`, so a null written as `Name=`
    /// loads again.
    pub fn optional<T: ConfigValue>(
        self,
        name: impl Into<String>,
        get: impl Fn(&S) -> Option<T> + 'static,
        set: impl Fn(&mut S, Option<T>) + 'static,
        null_literal: Option<&str>,
    ) -> Self {
        let name = name.into();
        let value_name = name.clone();
        let null_literal = null_literal.map(str::to_owned);
        let build: BuildFn<S> = Box::new(move |source| {
            let current = match (get(source), null_literal.as_deref()) {
                (None, Some(literal)) => Some(Parser::<T>::parse(&DefaultParser, Some(literal))?),
                (current, _) => current,
            };
            let value = NamedValue::with_value(value_name.clone(), current)
                .with_parser(FnParser::new(blank_as_none::<T>));
            Ok(Box::new(value) as Box<dyn ErasedValue>)
        });
        let apply: ApplyFn<S> = Box::new(move |stored, target| {
            let typed = downcast::<Option<T>>(stored)?;
            if typed.is_value_set() {
                set(target, typed.value().clone());
            }
            Ok(())
        });
        self.push(name, stored::<Option<T>>(), build, apply)
    }

    /// Binds a multi-valued field as the key's hidden default value: every
    /// positional line of the section becomes one element.
    pub fn positional<T: ConfigValue + Default>(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&S) -> Vec<T> + 'static,
        set: impl Fn(&mut S, Vec<T>) + 'static,
    ) -> Self {
        let name = name.into();
        let value_name = name.clone();
        let build: BuildFn<S> = Box::new(move |source| {
            let mut value = NamedValue::new(value_name.clone(), T::default());
            value.set_values(get(source));
            Ok(Box::new(value) as Box<dyn ErasedValue>)
        });
        let apply: ApplyFn<S> = Box::new(move |stored, target| {
            let typed = downcast::<T>(stored)?;
            let values = if typed.is_value_set() {
                typed.values().to_vec()
            } else {
                Vec::new()
            };
            set(target, values);
            Ok(())
        });
        self.default_value_name = Some(name.clone());
        self.push(name, stored::<T>(), build, apply).hidden()
    }

    /// Binds a field whose stored form differs from its in-memory form.
    pub fn converted<C: 'static, T: ConfigValue>(
        self,
        name: impl Into<String>,
        get: impl Fn(&S) -> C + 'static,
        set: impl Fn(&mut S, C) + 'static,
        conversion: Conversion<C, T>,
    ) -> Self {
        let name = name.into();
        let value_name = name.clone();
        let to_stored = conversion.clone();
        let build: BuildFn<S> = Box::new(move |source| {
            let stored = to_stored.forward(&get(source));
            Ok(Box::new(NamedValue::with_value(value_name.clone(), stored)) as Box<dyn ErasedValue>)
        });
        let apply: ApplyFn<S> = Box::new(move |stored, target| {
            let typed = downcast::<T>(stored)?;
            if typed.is_value_set() {
                set(target, conversion.backward(typed.value().clone()));
            }
            Ok(())
        });
        self.push(name, stored::<T>(), build, apply)
    }

    /// Hides the name of the most recently bound field on serialization.
    pub fn hidden(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.visible = false;
        }
        self
    }

    /// Builds a schema-fixed key from the current field values of `source`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateValue`] if two fields share a configured name,
    /// [`ConfigError::Parse`] if a null literal does not parse, and
    /// [`ConfigError::Argument`] for an empty key name.
    pub fn to_key(&self, source: &S) -> Result<ConfigKey, ConfigError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let mut value = (field.build)(source)?;
            value.set_name_visible(field.visible);
            values.push(value);
        }
        ConfigKey::fixed(self.name.clone(), values, self.default_value_name.as_deref())
    }

    /// Checks that `key` holds every bound value with the bound type, so
    /// [`apply`](Self::apply) cannot fail part way through.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ValueNotFound`] if `key` lacks a bound value and
    /// [`ConfigError::TypeConflict`] if a value has another type than bound.
    pub fn check(&self, key: &ConfigKey) -> Result<(), ConfigError> {
        for field in &self.fields {
            let stored = self.stored_value(key, field)?;
            let (type_id, requested) = field.stored_type;
            if stored.value_type_id() != type_id {
                return Err(ConfigError::TypeConflict {
                    name: field.config_name.clone(),
                    existing: stored.type_name(),
                    requested,
                });
            }
        }
        Ok(())
    }

    /// Writes the values stored in `key` back into `target`.
    ///
    /// Values that were never assigned leave their field untouched, except
    /// the positional field, which becomes empty.  `target` is only written
    /// once [`check`](Self::check) has passed.
    ///
    /// # Errors
    ///
    /// See [`check`](Self::check).
    pub fn apply(&self, key: &ConfigKey, target: &mut S) -> Result<(), ConfigError> {
        self.check(key)?;
        for field in &self.fields {
            (field.apply)(self.stored_value(key, field)?, target)?;
        }
        Ok(())
    }

    fn stored_value<'k>(
        &self,
        key: &'k ConfigKey,
        field: &FieldBinding<S>,
    ) -> Result<&'k dyn ErasedValue, ConfigError> {
        key.value(&field.config_name).ok_or_else(|| ConfigError::ValueNotFound {
            key: key.name().to_string(),
            value: field.config_name.clone(),
        })
    }

    fn push(
        mut self,
        config_name: String,
        stored_type: (TypeId, &'static str),
        build: BuildFn<S>,
        apply: ApplyFn<S>,
    ) -> Self {
        self.fields.push(FieldBinding {
            config_name,
            visible: true,
            stored_type,
            build,
            apply,
        });
        self
    }
}

fn stored<T: 'static>() -> (TypeId, &'static str) {
    (TypeId::of::<T>(), type_name::<T>())
}

/// Reads an optional value, treating a missing or blank literal as `None`.
fn blank_as_none<T: ConfigValue>(input: Option<&str>) -> Result<Option<T>, ConfigError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(literal) => Parser::<T>::parse(&DefaultParser, Some(literal)).map(Some),
    }
}

fn downcast<T: ConfigValue>(stored: &dyn ErasedValue) -> Result<&NamedValue<T>, ConfigError> {
    stored
        .as_any()
        .downcast_ref::<NamedValue<T>>()
        .ok_or_else(|| ConfigError::TypeConflict {
            name: stored.name().to_string(),
            existing: stored.type_name(),
            requested: type_name::<T>(),
        })
}
