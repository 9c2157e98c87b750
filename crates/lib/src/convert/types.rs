//! Runtime type descriptions used to select converters.
//!
//! Rust has no runtime subtype relation, so a type states its own ancestry:
//! a [`TypeDescriptor`] lists the keys a converter may be registered under for
//! it, each with a distance. The registry picks the converter registered for
//! the type itself, otherwise the one for the nearest listed ancestor.

use std::{
    any::{Any, TypeId},
    fmt,
};

use crate::{
    convert::{ConvertError, ConverterRegistry},
    mapper::SectionCheck,
    node::{KeyPolicy, Node},
};

/// Identity of a type, or of a capability a type declares.
///
/// Capabilities stand in for abstract supertypes: every enumeration declares
/// [`TypeKey::ENUM`] and every section declares [`TypeKey::SECTION`], and
/// applications may declare their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Concrete { id: TypeId, name: &'static str },
    Capability(&'static str),
}

impl TypeKey {
    /// Declared by every type mapped through [`EnumSymbol`].
    pub const ENUM: TypeKey = TypeKey::Capability("enum");
    /// Declared by every type mapped through [`Section`](crate::mapper::Section).
    pub const SECTION: TypeKey = TypeKey::Capability("section");

    /// The concrete key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey::Concrete {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub const fn capability(name: &'static str) -> Self {
        TypeKey::Capability(name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeKey::Concrete { name, .. } => name,
            TypeKey::Capability(name) => name,
        }
    }

    pub fn is_capability(&self) -> bool {
        matches!(self, TypeKey::Capability(_))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Concrete { name, .. } => f.write_str(name),
            TypeKey::Capability(name) => write!(f, "<{name}>"),
        }
    }
}

/// A supertype entry in a type's lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    pub key: TypeKey,
    /// Number of steps from the described type; 1 is a direct supertype
    pub distance: u32,
}

/// Symbol table of an enumeration.
pub trait EnumSymbol: Clone + Send + Sync + 'static {
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    fn symbol(&self) -> &'static str;

    /// Case-insensitive lookup of a variant by symbol.
    fn from_symbol(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::VARIANTS
            .iter()
            .find(|variant| variant.symbol().eq_ignore_ascii_case(text))
            .cloned()
    }
}

/// Type-erased view of an [`EnumSymbol`] implementor.
#[derive(Clone, Copy)]
pub struct EnumShape {
    symbols: fn() -> Vec<&'static str>,
    to_symbol: fn(&dyn Any) -> Option<&'static str>,
    from_symbol: fn(&str) -> Option<Box<dyn Any>>,
}

impl EnumShape {
    fn of<E: EnumSymbol>() -> Self {
        Self {
            symbols: || E::VARIANTS.iter().map(EnumSymbol::symbol).collect(),
            to_symbol: |value| value.downcast_ref::<E>().map(EnumSymbol::symbol),
            from_symbol: |text| E::from_symbol(text).map(|v| Box::new(v) as Box<dyn Any>),
        }
    }

    /// Valid symbols in declaration order.
    pub fn symbols(&self) -> Vec<&'static str> {
        (self.symbols)()
    }

    pub fn to_symbol(&self, value: &dyn Any) -> Option<&'static str> {
        (self.to_symbol)(value)
    }

    pub fn from_symbol(&self, text: &str) -> Option<Box<dyn Any>> {
        (self.from_symbol)(text)
    }
}

/// Type-erased entry points of a section type.
#[derive(Clone, Copy)]
pub struct SectionShape {
    pub(crate) to_node: fn(&dyn Any, &ConverterRegistry) -> Result<Node, ConvertError>,
    pub(crate) from_node: fn(&Node, &ConverterRegistry) -> Result<Box<dyn Any>, ConvertError>,
    pub(crate) check: SectionCheck,
}

impl SectionShape {
    pub fn to_node(
        &self,
        value: &dyn Any,
        registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        (self.to_node)(value, registry)
    }

    pub fn from_node(
        &self,
        node: &Node,
        registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        (self.from_node)(node, registry)
    }

    /// Validates the section's field table and those of its nested sections.
    pub fn check(
        &self,
        policy: KeyPolicy,
        visiting: &mut Vec<TypeId>,
    ) -> Result<(), crate::mapper::MappingError> {
        (self.check)(policy, visiting)
    }
}

/// Structural information a generic converter needs beyond the type key.
#[derive(Clone, Copy)]
pub enum Shape {
    Plain,
    Enum(EnumShape),
    Section(SectionShape),
}

/// Everything the registry knows about a type.
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    ancestors: Vec<Ancestor>,
    shape: Shape,
}

impl TypeDescriptor {
    /// A plain type with no declared ancestry.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            ancestors: Vec::new(),
            shape: Shape::Plain,
        }
    }

    /// An enumeration; declares [`TypeKey::ENUM`] as its direct supertype.
    pub fn enumeration<E: EnumSymbol>() -> Self {
        Self {
            key: TypeKey::of::<E>(),
            ancestors: Vec::new(),
            shape: Shape::Enum(EnumShape::of::<E>()),
        }
        .extends(TypeKey::ENUM, 1)
    }

    /// A section; declares [`TypeKey::SECTION`] as its direct supertype.
    pub fn section<S: crate::mapper::Section>() -> Self {
        Self {
            key: TypeKey::of::<S>(),
            ancestors: Vec::new(),
            shape: Shape::Section(crate::mapper::section_shape::<S>()),
        }
        .extends(TypeKey::SECTION, 1)
    }

    /// Declares a supertype `distance` steps away. Later declarations of the
    /// same key replace earlier ones.
    pub fn extends(mut self, key: TypeKey, distance: u32) -> Self {
        self.ancestors.retain(|ancestor| ancestor.key != key);
        self.ancestors.push(Ancestor { key, distance });
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn ancestors(&self) -> &[Ancestor] {
        &self.ancestors
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Distance from this type to `key`: 0 for the type itself, the declared
    /// distance for an ancestor, `None` when unrelated.
    pub fn rank(&self, key: &TypeKey) -> Option<u32> {
        if &self.key == key {
            return Some(0);
        }
        self.ancestors
            .iter()
            .find(|ancestor| &ancestor.key == key)
            .map(|ancestor| ancestor.distance)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.shape {
            Shape::Plain => "plain",
            Shape::Enum(_) => "enum",
            Shape::Section(_) => "section",
        };
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("ancestors", &self.ancestors)
            .field("shape", &shape)
            .finish()
    }
}

/// A reference to a type, stored in configuration by its name.
///
/// Only types declared on the registry can be resolved from text.
#[derive(Clone)]
pub struct TypeRef {
    descriptor: TypeDescriptor,
}

impl TypeRef {
    pub fn of<T: crate::convert::Convert>() -> Self {
        Self {
            descriptor: T::descriptor(),
        }
    }

    pub(crate) fn from_descriptor(descriptor: TypeDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub fn key(&self) -> TypeKey {
        self.descriptor.key()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Returns `true` if this refers to `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.key() == TypeKey::of::<T>()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
