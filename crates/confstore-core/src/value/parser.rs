//! String-to-value conversion for named values.
//!
//! Every [`NamedValue`](super::NamedValue) owns a [`Parser`].  The
//! [`DefaultParser`] resolves its conversion at run time from a table of
//! typed conversion functions keyed by [`TypeId`], so the declared type of a
//! value decides how its literals are read:
//!
//! | declared type                         | accepted literal                       |
//! |---------------------------------------|----------------------------------------|
//! | `String`                              | any text, passed through unchanged     |
//! | `bool`                                | `true` / `false`, case-insensitive     |
//! | integers, `f32`, `f64`, `char`        | the standard Rust `FromStr` syntax     |
//! | `rust_decimal::Decimal`               | decimal literal (`12.50`)              |
//! | `url::Url`                            | absolute URL                           |
//! | `DateTime<FixedOffset>`               | RFC 3339 timestamp                     |
//! | `NaiveDateTime`                       | `YYYY-MM-DDTHH:MM:SS[.fff]`            |
//! | `uuid::Uuid`                          | hyphenated or simple GUID              |
//! | [`TypeTag`]                           | the name of one of the types above     |
//! | `Option<T>` of any of the above       | as `T`; a null input yields `None`     |
//!
//! Enumerations are parsed by [`EnumParser`], which matches variant names
//! case-insensitively.  Any other type fails with
//! [`ConfigError::UnsupportedType`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::error::ConfigError;

/// Converts a literal into a value of type `T`.
///
/// `None` stands for a null literal.  Parsers that have no meaning for null
/// report a [`ConfigError::Parse`].
pub trait Parser<T>: Send + Sync {
    /// Parses `input` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the literal is malformed and
    /// [`ConfigError::UnsupportedType`] when the parser cannot produce `T`.
    fn parse(&self, input: Option<&str>) -> Result<T, ConfigError>;
}

/// The parser every named value gets unless another one is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultParser;

impl DefaultParser {
    /// Returns `true` when the default parser has a conversion for `T`.
    pub fn supports<T: Any>() -> bool {
        conversions().contains_key(&TypeId::of::<T>())
    }
}

impl<T: Any> Parser<T> for DefaultParser {
    fn parse(&self, input: Option<&str>) -> Result<T, ConfigError> {
        let convert = conversions()
            .get(&TypeId::of::<T>())
            .ok_or(ConfigError::UnsupportedType(type_name::<T>()))?;

        convert(input)?
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ConfigError::UnsupportedType(type_name::<T>()))
    }
}

/// An enumeration whose variants can be selected by name.
///
/// ```rust
/// use confstore_core::ConfigEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Level { Low, High }
///
/// impl ConfigEnum for Level {
///     fn variants() -> &'static [Self] { &[Level::Low, Level::High] }
///     fn variant_name(self) -> &'static str {
///         match self { Level::Low => "Low", Level::High => "High" }
///     }
/// }
/// ```
pub trait ConfigEnum: Copy + Send + Sync + 'static {
    /// All variants, in declaration order.
    fn variants() -> &'static [Self];
    /// The name used for the variant in configuration text.
    fn variant_name(self) -> &'static str;
}

/// Parses [`ConfigEnum`] variants by case-insensitive name.
pub struct EnumParser<E>(PhantomData<fn() -> E>);

impl<E> EnumParser<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EnumParser<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumParser<{}>", type_name::<E>())
    }
}

impl<E: ConfigEnum> Parser<E> for EnumParser<E> {
    fn parse(&self, input: Option<&str>) -> Result<E, ConfigError> {
        let literal = input
            .ok_or_else(|| ConfigError::parse(None, type_name::<E>(), "null literal"))?
            .trim();

        E::variants()
            .iter()
            .copied()
            .find(|variant| variant.variant_name().eq_ignore_ascii_case(literal))
            .ok_or_else(|| ConfigError::parse(Some(literal), type_name::<E>(), "no such variant"))
    }
}

/// Wraps a parser so that a null input yields `None` instead of an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalParser<P>(pub P);

impl<T, P: Parser<T>> Parser<Option<T>> for OptionalParser<P> {
    fn parse(&self, input: Option<&str>) -> Result<Option<T>, ConfigError> {
        match input {
            None => Ok(None),
            Some(literal) => self.0.parse(Some(literal)).map(Some),
        }
    }
}

/// Adapts a closure into a [`Parser`].
pub struct FnParser<F>(F);

impl<F> FnParser<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> fmt::Debug for FnParser<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnParser")
    }
}

impl<T, F> Parser<T> for FnParser<F>
where
    F: Fn(Option<&str>) -> Result<T, ConfigError> + Send + Sync,
{
    fn parse(&self, input: Option<&str>) -> Result<T, ConfigError> {
        (self.0)(input)
    }
}

// ── Type-by-name lookup ───────────────────────────────────────────────────────

/// Names one of the value types the default parser understands.
///
/// Parsing a `TypeTag` is the type-by-name lookup: the literal `"u16"`
/// yields [`TypeTag::U16`].  Matching is case-insensitive and accepts a few
/// common aliases (`"int"`, `"string"`, `"guid"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    I8,
    Char,
    Decimal,
    F64,
    F32,
    I32,
    U32,
    I64,
    U64,
    I16,
    U16,
    String,
    Url,
    DateTime,
    NaiveDateTime,
    Uuid,
    TypeTag,
}

impl TypeTag {
    const ALL: [TypeTag; 19] = [
        TypeTag::Bool,
        TypeTag::U8,
        TypeTag::I8,
        TypeTag::Char,
        TypeTag::Decimal,
        TypeTag::F64,
        TypeTag::F32,
        TypeTag::I32,
        TypeTag::U32,
        TypeTag::I64,
        TypeTag::U64,
        TypeTag::I16,
        TypeTag::U16,
        TypeTag::String,
        TypeTag::Url,
        TypeTag::DateTime,
        TypeTag::NaiveDateTime,
        TypeTag::Uuid,
        TypeTag::TypeTag,
    ];

    /// Canonical name written to configuration text.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::U8 => "u8",
            TypeTag::I8 => "i8",
            TypeTag::Char => "char",
            TypeTag::Decimal => "decimal",
            TypeTag::F64 => "f64",
            TypeTag::F32 => "f32",
            TypeTag::I32 => "i32",
            TypeTag::U32 => "u32",
            TypeTag::I64 => "i64",
            TypeTag::U64 => "u64",
            TypeTag::I16 => "i16",
            TypeTag::U16 => "u16",
            TypeTag::String => "string",
            TypeTag::Url => "url",
            TypeTag::DateTime => "datetime",
            TypeTag::NaiveDateTime => "naivedatetime",
            TypeTag::Uuid => "uuid",
            TypeTag::TypeTag => "type",
        }
    }

    /// The [`TypeId`] of the Rust type this tag names.
    pub fn rust_type_id(self) -> TypeId {
        match self {
            TypeTag::Bool => TypeId::of::<bool>(),
            TypeTag::U8 => TypeId::of::<u8>(),
            TypeTag::I8 => TypeId::of::<i8>(),
            TypeTag::Char => TypeId::of::<char>(),
            TypeTag::Decimal => TypeId::of::<Decimal>(),
            TypeTag::F64 => TypeId::of::<f64>(),
            TypeTag::F32 => TypeId::of::<f32>(),
            TypeTag::I32 => TypeId::of::<i32>(),
            TypeTag::U32 => TypeId::of::<u32>(),
            TypeTag::I64 => TypeId::of::<i64>(),
            TypeTag::U64 => TypeId::of::<u64>(),
            TypeTag::I16 => TypeId::of::<i16>(),
            TypeTag::U16 => TypeId::of::<u16>(),
            TypeTag::String => TypeId::of::<String>(),
            TypeTag::Url => TypeId::of::<Url>(),
            TypeTag::DateTime => TypeId::of::<DateTime<FixedOffset>>(),
            TypeTag::NaiveDateTime => TypeId::of::<NaiveDateTime>(),
            TypeTag::Uuid => TypeId::of::<Uuid>(),
            TypeTag::TypeTag => TypeId::of::<TypeTag>(),
        }
    }

    /// Returns the tag naming `T`, if `T` is one of the tagged types.
    pub fn of<T: Any>() -> Option<TypeTag> {
        let id = TypeId::of::<T>();
        Self::ALL.into_iter().find(|tag| tag.rust_type_id() == id)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "boolean" => "bool",
            "byte" => "u8",
            "sbyte" => "i8",
            "double" => "f64",
            "float" | "single" => "f32",
            "int" => "i32",
            "uint" => "u32",
            "long" => "i64",
            "ulong" => "u64",
            "short" => "i16",
            "ushort" => "u16",
            "str" | "object" => "string",
            "uri" => "url",
            "timestamp" => "datetime",
            "guid" => "uuid",
            other => other,
        };

        Self::ALL
            .into_iter()
            .find(|tag| tag.name() == alias)
            .ok_or_else(|| format!("unknown type name '{}'", s.trim()))
    }
}

// ── Conversion table ──────────────────────────────────────────────────────────

type Conversion = fn(Option<&str>) -> Result<Box<dyn Any>, ConfigError>;

/// Parses a non-null literal through `FromStr`, trimming surrounding spaces.
fn from_str_literal<T>(input: Option<&str>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let literal = input.ok_or_else(|| ConfigError::parse(None, type_name::<T>(), "null literal"))?;
    literal
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::parse(Some(literal), type_name::<T>(), e))
}

fn bool_literal(input: Option<&str>) -> Result<bool, ConfigError> {
    let literal = input.ok_or_else(|| ConfigError::parse(None, "bool", "null literal"))?;
    match literal.trim() {
        t if t.eq_ignore_ascii_case("true") => Ok(true),
        f if f.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::parse(Some(literal), "bool", "expected 'true' or 'false'")),
    }
}

fn string_literal(input: Option<&str>) -> Result<String, ConfigError> {
    Ok(input.unwrap_or_default().to_owned())
}

fn datetime_literal(input: Option<&str>) -> Result<DateTime<FixedOffset>, ConfigError> {
    let literal = input.ok_or_else(|| {
        ConfigError::parse(None, type_name::<DateTime<FixedOffset>>(), "null literal")
    })?;
    DateTime::parse_from_rfc3339(literal.trim())
        .map_err(|e| ConfigError::parse(Some(literal), type_name::<DateTime<FixedOffset>>(), e))
}

fn naive_datetime_literal(input: Option<&str>) -> Result<NaiveDateTime, ConfigError> {
    let literal =
        input.ok_or_else(|| ConfigError::parse(None, type_name::<NaiveDateTime>(), "null literal"))?;
    let trimmed = literal.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| ConfigError::parse(Some(literal), type_name::<NaiveDateTime>(), e))
}

fn type_tag_literal(input: Option<&str>) -> Result<TypeTag, ConfigError> {
    from_str_literal::<TypeTag>(input)
}

fn boxed<T: Any>(value: T) -> Box<dyn Any> {
    Box::new(value)
}

/// Registers `T` and `Option<T>` under `convert`.
macro_rules! register {
    ($table:ident, $t:ty, $convert:expr) => {{
        fn required(input: Option<&str>) -> Result<Box<dyn Any>, ConfigError> {
            $convert(input).map(boxed::<$t>)
        }
        fn optional(input: Option<&str>) -> Result<Box<dyn Any>, ConfigError> {
            match input {
                None => Ok(boxed::<Option<$t>>(None)),
                Some(_) => $convert(input).map(|v: $t| boxed(Some(v))),
            }
        }
        $table.insert(TypeId::of::<$t>(), required as Conversion);
        $table.insert(TypeId::of::<Option<$t>>(), optional as Conversion);
    }};
}

fn conversions() -> &'static HashMap<TypeId, Conversion> {
    static TABLE: OnceLock<HashMap<TypeId, Conversion>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<TypeId, Conversion> = HashMap::new();
        register!(table, String, string_literal);
        register!(table, bool, bool_literal);
        register!(table, u8, from_str_literal::<u8>);
        register!(table, i8, from_str_literal::<i8>);
        register!(table, char, from_str_literal::<char>);
        register!(table, Decimal, from_str_literal::<Decimal>);
        register!(table, f64, from_str_literal::<f64>);
        register!(table, f32, from_str_literal::<f32>);
        register!(table, i32, from_str_literal::<i32>);
        register!(table, u32, from_str_literal::<u32>);
        register!(table, i64, from_str_literal::<i64>);
        register!(table, u64, from_str_literal::<u64>);
        register!(table, i16, from_str_literal::<i16>);
        register!(table, u16, from_str_literal::<u16>);
        register!(table, Url, from_str_literal::<Url>);
        register!(table, DateTime<FixedOffset>, datetime_literal);
        register!(table, NaiveDateTime, naive_datetime_literal);
        register!(table, Uuid, from_str_literal::<Uuid>);
        register!(table, TypeTag, type_tag_literal);
        table
    })
}
