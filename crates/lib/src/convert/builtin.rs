//! Converters installed by [`ConverterRegistryBuilder::with_builtins`].
//!
//! Text is accepted for every scalar type so that values written in
//! text-only formats read back. Numeric conversions are range checked.

use std::{any::Any, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{
    ConvertError, Converter, ConverterRegistry, ConverterRegistryBuilder, LanguageTag, Shape,
    TypeDescriptor, TypeKey, TypeRef,
};
use crate::node::{Node, Scalar};

pub(super) fn register(builder: ConverterRegistryBuilder) -> ConverterRegistryBuilder {
    let builder = builder
        .register_fn::<bool, _, _>("bool", |v| Ok(Node::scalar(*v)), bool_from_node)
        .register_fn::<String, _, _>(
            "string",
            |v| Ok(Node::scalar(v.as_str())),
            |node| Ok(expect_scalar("string", node)?.as_text()),
        )
        .register_fn::<char, _, _>("char", |v| Ok(Node::scalar(v.to_string())), char_from_node)
        .register_fn::<f64, _, _>("f64", |v| Ok(Node::scalar(*v)), |node| float("f64", node))
        .register_fn::<f32, _, _>(
            "f32",
            |v| Ok(Node::scalar(f64::from(*v))),
            |node| float("f32", node).map(|f| f as f32),
        )
        .register_fn::<Uuid, _, _>("uuid", |v| Ok(Node::scalar(*v)), uuid_from_node)
        .register_fn::<DateTime<Utc>, _, _>("date", |v| Ok(Node::scalar(*v)), date_from_node)
        .register_fn::<LanguageTag, _, _>(
            "locale",
            |v| Ok(Node::scalar(v.to_string())),
            |node| expect_scalar("locale", node)?.as_text().parse(),
        )
        .register(TypeKey::of::<TypeRef>(), TypeRefConverter)
        .register(TypeKey::ENUM, EnumConverter)
        .register(TypeKey::SECTION, SectionConverter);
    register_integers(builder)
}

macro_rules! integers {
    ($builder:expr, $($ty:ty),+ $(,)?) => {{
        let builder = $builder;
        $(
            let builder = builder.register_fn::<$ty, _, _>(
                stringify!($ty),
                |v| Ok(integer_to_node(*v)),
                |node| integer::<$ty>(stringify!($ty), node),
            );
        )+
        builder
    }};
}

fn register_integers(builder: ConverterRegistryBuilder) -> ConverterRegistryBuilder {
    integers!(builder, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize)
}

/// Returns the scalar of `node`, or a conversion failure naming its kind.
pub(crate) fn expect_scalar<'n>(
    converter: &str,
    node: &'n Node,
) -> Result<&'n Scalar, ConvertError> {
    node.value().ok_or_else(|| {
        ConvertError::conversion(
            converter,
            node,
            format!("expected a scalar, found a {} node", node.kind_name()),
        )
    })
}

/// Parses the boolean spellings accepted in configuration, ignoring case.
///
/// ```
/// # use cfgtree::convert::parse_bool;
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn bool_from_node(node: &Node) -> Result<bool, ConvertError> {
    let parsed = match expect_scalar("bool", node)? {
        Scalar::Bool(b) => Some(*b),
        Scalar::Int(0) => Some(false),
        Scalar::Int(1) => Some(true),
        Scalar::Int(_) | Scalar::Float(_) => None,
        other => parse_bool(&other.as_text()),
    };
    parsed.ok_or_else(|| {
        ConvertError::conversion(
            "bool",
            node,
            "expected one of true/on/yes/1 or false/off/no/0",
        )
    })
}

fn char_from_node(node: &Node) -> Result<char, ConvertError> {
    let text = expect_scalar("char", node)?.as_text();
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConvertError::conversion(
            "char",
            node,
            "expected exactly one character",
        )),
    }
}

fn integer_to_node<T>(value: T) -> Node
where
    T: TryInto<i64> + ToString + Copy,
{
    match value.try_into() {
        Ok(n) => Node::scalar(n),
        // Only u64/usize above i64::MAX get here; the digits survive as text
        Err(_) => Node::scalar(value.to_string()),
    }
}

fn integer<T>(converter: &str, node: &Node) -> Result<T, ConvertError>
where
    T: TryFrom<i64> + FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let out_of_range = || {
        ConvertError::conversion(converter, node, format!("value out of range for {converter}"))
    };
    match expect_scalar(converter, node)? {
        Scalar::Int(n) => T::try_from(*n).map_err(|_| out_of_range()),
        Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if *f < i64::MIN as f64 || *f > i64::MAX as f64 {
                return Err(out_of_range());
            }
            T::try_from(*f as i64).map_err(|_| out_of_range())
        }
        Scalar::Float(_) | Scalar::Bool(_) => Err(ConvertError::conversion(
            converter,
            node,
            "expected an integer",
        )),
        other => other.as_text().trim().parse::<T>().map_err(|e| {
            ConvertError::conversion(converter, node, "expected an integer").with_source(e)
        }),
    }
}

fn float(converter: &str, node: &Node) -> Result<f64, ConvertError> {
    match expect_scalar(converter, node)? {
        Scalar::Float(f) => Ok(*f),
        Scalar::Int(n) => Ok(*n as f64),
        Scalar::Bool(_) => Err(ConvertError::conversion(converter, node, "expected a number")),
        other => other.as_text().trim().parse::<f64>().map_err(|e| {
            ConvertError::conversion(converter, node, "expected a number").with_source(e)
        }),
    }
}

fn uuid_from_node(node: &Node) -> Result<Uuid, ConvertError> {
    match expect_scalar("uuid", node)? {
        Scalar::Uuid(id) => Ok(*id),
        other => Uuid::parse_str(other.as_text().trim()).map_err(|e| {
            ConvertError::conversion("uuid", node, "expected a UUID").with_source(e)
        }),
    }
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as
/// midnight UTC.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn date_from_node(node: &Node) -> Result<DateTime<Utc>, ConvertError> {
    match expect_scalar("date", node)? {
        Scalar::Date(date) => Ok(*date),
        other => parse_date(&other.as_text()).ok_or_else(|| {
            ConvertError::conversion(
                "date",
                node,
                "expected an RFC 3339 timestamp or YYYY-MM-DD",
            )
        }),
    }
}

/// Writes type references by name and resolves them through the declared
/// types of the registry chain.
struct TypeRefConverter;

impl Converter for TypeRefConverter {
    fn name(&self) -> &str {
        "type"
    }

    fn to_node(
        &self,
        value: &dyn Any,
        _ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        let type_ref = value
            .downcast_ref::<TypeRef>()
            .ok_or_else(|| ConvertError::TypeMismatch {
                converter: self.name().to_string(),
                expected: "TypeRef".to_string(),
            })?;
        Ok(Node::scalar(Scalar::TypeRef(type_ref.name().to_string())))
    }

    fn from_node(
        &self,
        node: &Node,
        _ty: &TypeDescriptor,
        registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        let name = expect_scalar(self.name(), node)?.as_text();
        let type_ref = registry.resolve_type(&name).ok_or_else(|| {
            ConvertError::conversion(self.name(), node, "type is not declared on the registry")
        })?;
        Ok(Box::new(type_ref))
    }
}

/// Handles every type declaring [`TypeKey::ENUM`].
struct EnumConverter;

impl EnumConverter {
    fn shape<'t>(
        &self,
        ty: &'t TypeDescriptor,
        offending: &dyn std::fmt::Display,
    ) -> Result<&'t super::EnumShape, ConvertError> {
        match ty.shape() {
            Shape::Enum(shape) => Ok(shape),
            _ => Err(ConvertError::conversion(
                self.name(),
                offending,
                format!("{} does not describe its symbols", ty.name()),
            )),
        }
    }
}

impl Converter for EnumConverter {
    fn name(&self) -> &str {
        "enum"
    }

    fn to_node(
        &self,
        value: &dyn Any,
        ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        let shape = self.shape(ty, &ty.name())?;
        let symbol = shape
            .to_symbol(value)
            .ok_or_else(|| ConvertError::TypeMismatch {
                converter: self.name().to_string(),
                expected: ty.name().to_string(),
            })?;
        Ok(Node::scalar(Scalar::Symbol(symbol.to_string())))
    }

    fn from_node(
        &self,
        node: &Node,
        ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        let shape = self.shape(ty, node)?;
        let text = expect_scalar(self.name(), node)?.as_text();
        shape.from_symbol(&text).ok_or_else(|| {
            ConvertError::conversion(
                self.name(),
                node,
                format!(
                    "unknown {} symbol, expected one of: {}",
                    ty.name(),
                    shape.symbols().join(", ")
                ),
            )
        })
    }
}

/// Handles every type declaring [`TypeKey::SECTION`] by running the
/// structural mapper on it.
struct SectionConverter;

impl Converter for SectionConverter {
    fn name(&self) -> &str {
        "section"
    }

    fn to_node(
        &self,
        value: &dyn Any,
        ty: &TypeDescriptor,
        registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        match ty.shape() {
            Shape::Section(shape) => shape.to_node(value, registry),
            _ => Err(ConvertError::conversion(
                self.name(),
                ty.name(),
                "type does not describe its fields",
            )),
        }
    }

    fn from_node(
        &self,
        node: &Node,
        ty: &TypeDescriptor,
        registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        match ty.shape() {
            Shape::Section(shape) => shape.from_node(node, registry),
            _ => Err(ConvertError::conversion(
                self.name(),
                node,
                format!("{} does not describe its fields", ty.name()),
            )),
        }
    }
}
