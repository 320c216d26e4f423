//! Argument conversion: primitive coercion plus the typed converter registry.
//!
//! Primitive parameters (`bool`, integers, floats, strings) are coerced
//! directly from one token. Every other parameter type must have a
//! [`Converter`] registered; its overloads are keyed by how many tokens they
//! accept, and a single compound token such as `1,2,3` is split on commas
//! before the overload is chosen.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use devcon_types::color::{Color, parse_hex_color};
use devcon_types::error::{ConsoleError, Result};
use devcon_types::math::{Vec2, Vec3};

/// Identity of a converter target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }

    /// Short type name, e.g. `Color`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Declared type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Text,
    /// Converted through the [`ConverterRegistry`].
    Typed(TypeKey),
}

impl ParamType {
    pub fn of<T: Any>() -> Self {
        Self::Typed(TypeKey::of::<T>())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "string",
            Self::Typed(key) => key.name(),
        }
    }
}

/// A converted argument value.
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Typed(Box<dyn Any>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Text(v) => write!(f, "Text({v:?})"),
            Self::Typed(_) => write!(f, "Typed(..)"),
        }
    }
}

/// Coerce a single token to a primitive parameter type.
///
/// Returns `None` for [`ParamType::Typed`], which the registry handles.
pub fn coerce(ty: ParamType, token: &str) -> Option<Result<Value>> {
    let value = match ty {
        ParamType::Bool => parse_bool(token).map(Value::Bool),
        ParamType::Int => token.trim().parse::<i64>().ok().map(Value::Int),
        ParamType::Float => token.trim().parse::<f64>().ok().map(Value::Float),
        ParamType::Text => Some(Value::Text(token.to_string())),
        ParamType::Typed(_) => return None,
    };
    Some(value.ok_or(ConsoleError::ParameterConversion))
}

fn parse_bool(token: &str) -> Option<bool> {
    let t = token.trim();
    if t.eq_ignore_ascii_case("true") || t == "1" {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") || t == "0" {
        Some(false)
    } else {
        None
    }
}

/// Parse exactly `N` float tokens.
pub fn parse_floats<const N: usize>(tokens: &[&str]) -> Result<[f32; N]> {
    if tokens.len() != N {
        return Err(ConsoleError::Conversion(format!(
            "expected {N} numbers, got {}",
            tokens.len()
        )));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .trim()
            .parse::<f32>()
            .map_err(|_| ConsoleError::Conversion(format!("not a number: {token}")))?;
    }
    Ok(out)
}

/// Conversion function taking a fixed number of tokens.
pub type OverloadFn<T> = Box<dyn Fn(&[&str]) -> Result<T>>;

/// One conversion function and the token count it accepts.
pub struct Overload<T> {
    arity: usize,
    convert: OverloadFn<T>,
}

impl<T> Overload<T> {
    pub fn new(arity: usize, convert: impl Fn(&[&str]) -> Result<T> + 'static) -> Self {
        Self {
            arity,
            convert: Box::new(convert),
        }
    }
}

/// A set of conversion functions producing one target type.
pub trait Converter {
    type Target: Any;

    /// Overloads in priority order. When two accept the same token count the
    /// earlier one is used.
    fn overloads(self) -> Vec<Overload<Self::Target>>;
}

struct ConverterEntry {
    type_name: &'static str,
    overloads: Vec<Overload<Box<dyn Any>>>,
}

/// Registry of typed converters, keyed by target type.
///
/// Populated once at start-up; lookups never mutate it.
#[derive(Default)]
pub struct ConverterRegistry {
    entries: HashMap<TypeId, ConverterEntry>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the color and vector converters.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(ColorConverter);
        reg.register(Vec2Converter);
        reg.register(Vec3Converter);
        reg
    }

    /// Add every overload of `converter`.
    ///
    /// Registering a second converter for the same target appends its
    /// overloads after the existing ones.
    pub fn register<C: Converter>(&mut self, converter: C) {
        let key = TypeKey::of::<C::Target>();
        let entry = self.entries.entry(key.id).or_insert_with(|| ConverterEntry {
            type_name: key.name(),
            overloads: Vec::new(),
        });
        for overload in converter.overloads() {
            let Overload { arity, convert } = overload;
            entry.overloads.push(Overload::new(arity, move |tokens: &[&str]| {
                convert(tokens).map(|v| Box::new(v) as Box<dyn Any>)
            }));
        }
        log::debug!(
            "Registered converter for {} ({} overloads)",
            key.name(),
            entry.overloads.len()
        );
    }

    pub fn has_conversion(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key.id)
    }

    /// Convert `tokens` into a boxed value of the target type.
    pub fn convert(&self, key: TypeKey, tokens: &[&str]) -> Result<Box<dyn Any>> {
        let no_overload = || ConsoleError::NoConversionOverload {
            type_name: key.name().to_string(),
            arity: tokens.len(),
        };
        let entry = self.entries.get(&key.id).ok_or_else(no_overload)?;

        let mut matching = entry.overloads.iter().filter(|o| o.arity == tokens.len());
        let chosen = matching.next().ok_or_else(no_overload)?;
        let others = matching.count();
        if others > 0 {
            log::warn!(
                "Found {} conversions for '{}' taking {} parameters. First one was chosen by default.",
                others + 1,
                entry.type_name,
                tokens.len()
            );
        }
        (chosen.convert)(tokens)
    }

    /// Typed convenience wrapper around [`convert`](Self::convert).
    pub fn convert_to<T: Any>(&self, tokens: &[&str]) -> Result<T> {
        let boxed = self.convert(TypeKey::of::<T>(), tokens)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| ConsoleError::ParameterConversion)
    }
}

// ---------------------------------------------------------------------------
// Reference converters
// ---------------------------------------------------------------------------

/// `r g b a`, `r g b` (0-255 scale), or one palette name / `#hex` token.
pub struct ColorConverter;

impl Converter for ColorConverter {
    type Target = Color;

    fn overloads(self) -> Vec<Overload<Color>> {
        vec![
            Overload::new(4, |t: &[&str]| {
                let [r, g, b, a] = parse_floats::<4>(t)?;
                Ok(Color::from_channels(r, g, b, a))
            }),
            Overload::new(3, |t: &[&str]| {
                let [r, g, b] = parse_floats::<3>(t)?;
                Ok(Color::from_channels(r, g, b, 255.0))
            }),
            Overload::new(1, |t: &[&str]| {
                let token = t[0].trim();
                if token.starts_with('#') {
                    parse_hex_color(token)
                        .ok_or_else(|| ConsoleError::Conversion(format!("Invalid hex color {token}.")))
                } else {
                    Color::from_name(token)
                        .ok_or_else(|| ConsoleError::Conversion(format!("Unknown color {token}.")))
                }
            }),
        ]
    }
}

/// `x y`, or one value used for both components.
pub struct Vec2Converter;

impl Converter for Vec2Converter {
    type Target = Vec2;

    fn overloads(self) -> Vec<Overload<Vec2>> {
        vec![
            Overload::new(2, |t: &[&str]| {
                let [x, y] = parse_floats::<2>(t)?;
                Ok(Vec2::new(x, y))
            }),
            Overload::new(1, |t: &[&str]| {
                let [v] = parse_floats::<1>(t)?;
                Ok(Vec2::splat(v))
            }),
        ]
    }
}

/// `x y z`, `x y` (z = 0), or one value used for all components.
pub struct Vec3Converter;

impl Converter for Vec3Converter {
    type Target = Vec3;

    fn overloads(self) -> Vec<Overload<Vec3>> {
        vec![
            Overload::new(3, |t: &[&str]| {
                let [x, y, z] = parse_floats::<3>(t)?;
                Ok(Vec3::new(x, y, z))
            }),
            Overload::new(2, |t: &[&str]| {
                let [x, y] = parse_floats::<2>(t)?;
                Ok(Vec3::new(x, y, 0.0))
            }),
            Overload::new(1, |t: &[&str]| {
                let [v] = parse_floats::<1>(t)?;
                Ok(Vec3::splat(v))
            }),
        ]
    }
}

/// A named host object resolved at conversion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: u64,
    pub name: String,
}

/// Resolves a single name token through a host-provided lookup.
pub struct EntityConverter {
    lookup: Box<dyn Fn(&str) -> Option<EntityRef>>,
}

impl EntityConverter {
    pub fn new(lookup: impl Fn(&str) -> Option<EntityRef> + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Converter for EntityConverter {
    type Target = EntityRef;

    fn overloads(self) -> Vec<Overload<EntityRef>> {
        let lookup = self.lookup;
        vec![Overload::new(1, move |t: &[&str]| {
            lookup(t[0]).ok_or_else(|| ConsoleError::ReferenceNotFound(t[0].to_string()))
        })]
    }
}

// ---------------------------------------------------------------------------
// Converted argument list
// ---------------------------------------------------------------------------

/// Converted arguments in declaration order.
#[derive(Debug, Default)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| ConsoleError::handler(format!("missing argument {index}")))
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.value(index)? {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch(index, "bool", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.value(index)? {
            Value::Int(v) => Ok(*v),
            other => Err(mismatch(index, "int", other)),
        }
    }

    /// Float argument; integer arguments widen.
    pub fn float(&self, index: usize) -> Result<f64> {
        match self.value(index)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(mismatch(index, "float", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str> {
        match self.value(index)? {
            Value::Text(v) => Ok(v),
            other => Err(mismatch(index, "string", other)),
        }
    }

    /// A value produced by a registered converter.
    pub fn get<T: Any>(&self, index: usize) -> Result<&T> {
        match self.value(index)? {
            Value::Typed(boxed) => boxed.downcast_ref::<T>().ok_or_else(|| {
                ConsoleError::handler(format!(
                    "argument {index} is not a {}",
                    TypeKey::of::<T>().name()
                ))
            }),
            other => Err(mismatch(index, TypeKey::of::<T>().name(), other)),
        }
    }
}

fn mismatch(index: usize, wanted: &str, got: &Value) -> ConsoleError {
    ConsoleError::handler(format!("argument {index} is not a {wanted}: {got:?}"))
}
