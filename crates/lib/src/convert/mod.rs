//! Bidirectional conversion between typed values and nodes.
//!
//! Scalars and registered types go through a [`ConverterRegistry`]; options,
//! sequences and string-keyed maps are converted structurally, element by
//! element, so a `Vec<Mode>` works as soon as `Mode` converts.
//!
//! ```
//! use cfgtree::convert::{Convert, ConverterRegistry};
//! use cfgtree::node::{ListNode, Node};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Mode { Fast, Safe }
//! cfgtree::enum_symbols!(Mode { Fast, Safe });
//!
//! let registry = ConverterRegistry::new();
//! let node = vec![Mode::Safe, Mode::Fast].to_node(&registry)?;
//! assert_eq!(node.to_string(), "[Safe, Fast]");
//!
//! let list = Node::list(ListNode::from(vec![Node::from("safe")]));
//! let modes: Option<Vec<Mode>> = registry.convert_from_node(&list)?;
//! assert_eq!(modes, Some(vec![Mode::Safe]));
//! # Ok::<(), cfgtree::convert::ConvertError>(())
//! ```

use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    mapper::MappingError,
    node::{KeyPolicy, ListNode, MapNode, Node, NodeKind},
};

mod builtin;
pub mod errors;
pub mod locale;
pub mod registry;
pub mod types;

pub use builtin::parse_bool;
pub use errors::ConvertError;
pub use locale::LanguageTag;
pub use registry::{Converter, ConverterRegistry, ConverterRegistryBuilder, FnConverter};
pub use types::{
    Ancestor, EnumShape, EnumSymbol, SectionShape, Shape, TypeDescriptor, TypeKey, TypeRef,
};

/// A type that can be written to and read from a node tree.
///
/// The provided methods dispatch through the registry using
/// [`Convert::descriptor`]; a type registered with
/// [`ConverterRegistryBuilder::register_fn`] only needs an empty impl.
/// Structural types override the methods instead.
pub trait Convert: Sized + 'static {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>()
    }

    fn to_node(&self, registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        registry.dispatch_to_node(self, &Self::descriptor())
    }

    fn from_node(node: &Node, registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        registry.dispatch_from_node(node, &Self::descriptor())
    }

    /// Validates the field tables of section types reachable through this
    /// type. `visiting` holds the sections already being checked.
    fn check_sections(policy: KeyPolicy, visiting: &mut Vec<TypeId>) -> Result<(), MappingError> {
        match Self::descriptor().shape() {
            Shape::Section(shape) => shape.check(policy, visiting),
            _ => Ok(()),
        }
    }
}

macro_rules! convert_via_registry {
    ($($ty:ty),+ $(,)?) => {
        $(impl Convert for $ty {})+
    };
}

convert_via_registry!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    Uuid,
    DateTime<Utc>,
    LanguageTag,
    TypeRef,
);

/// Implements [`EnumSymbol`] and [`Convert`] for a fieldless enum. Symbols
/// are the variant names; reading ignores case.
///
/// ```
/// #[derive(Debug, Clone, PartialEq)]
/// enum Level { Low, High }
/// cfgtree::enum_symbols!(Level { Low, High });
///
/// use cfgtree::convert::EnumSymbol;
/// assert_eq!(Level::from_symbol("HIGH"), Some(Level::High));
/// ```
#[macro_export]
macro_rules! enum_symbols {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::convert::EnumSymbol for $ty {
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl $crate::convert::Convert for $ty {
            fn descriptor() -> $crate::convert::TypeDescriptor {
                $crate::convert::TypeDescriptor::enumeration::<Self>()
            }
        }
    };
}

impl<T: Convert> Convert for Option<T> {
    fn to_node(&self, registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        match self {
            Some(value) => value.to_node(registry),
            None => Ok(Node::null()),
        }
    }

    fn check_sections(policy: KeyPolicy, visiting: &mut Vec<TypeId>) -> Result<(), MappingError> {
        T::check_sections(policy, visiting)
    }

    fn from_node(node: &Node, registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        if node.is_null() {
            return Ok(None);
        }
        T::from_node(node, registry).map(Some)
    }
}

impl<T: Convert> Convert for Vec<T> {
    fn to_node(&self, registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        self.iter()
            .map(|item| item.to_node(registry))
            .collect::<Result<ListNode, _>>()
            .map(Node::list)
    }

    fn from_node(node: &Node, registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        let list = node.as_list().ok_or_else(|| {
            ConvertError::conversion(
                "list",
                node,
                format!("expected a list, found a {} node", node.kind_name()),
            )
        })?;
        list.iter().map(|item| T::from_node(item, registry)).collect()
    }

    fn check_sections(policy: KeyPolicy, visiting: &mut Vec<TypeId>) -> Result<(), MappingError> {
        T::check_sections(policy, visiting)
    }
}

fn map_to_node<'a, T, I>(entries: I, registry: &ConverterRegistry) -> Result<Node, ConvertError>
where
    T: Convert,
    I: IntoIterator<Item = (&'a String, &'a T)>,
{
    let mut map = MapNode::with_policy(registry.key_policy());
    for (key, value) in entries {
        let node = value.to_node(registry)?;
        map.insert_exact_node(key, node).map_err(|e| {
            ConvertError::conversion("map", key, "keys collide after normalization").with_source(e)
        })?;
    }
    Ok(Node::map(map))
}

fn map_from_node<'n>(node: &'n Node) -> Result<&'n MapNode, ConvertError> {
    node.as_map().ok_or_else(|| {
        ConvertError::conversion(
            "map",
            node,
            format!("expected a map, found a {} node", node.kind_name()),
        )
    })
}

impl<T: Convert> Convert for BTreeMap<String, T> {
    fn to_node(&self, registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        map_to_node(self, registry)
    }

    fn from_node(node: &Node, registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        map_from_node(node)?
            .iter()
            .map(|(key, value)| Ok((key.to_string(), T::from_node(value, registry)?)))
            .collect()
    }

    fn check_sections(policy: KeyPolicy, visiting: &mut Vec<TypeId>) -> Result<(), MappingError> {
        T::check_sections(policy, visiting)
    }
}

impl<T, H> Convert for HashMap<String, T, H>
where
    T: Convert,
    H: BuildHasher + Default + 'static,
{
    fn to_node(&self, registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        map_to_node(self, registry)
    }

    fn from_node(node: &Node, registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        map_from_node(node)?
            .iter()
            .map(|(key, value)| Ok((key.to_string(), T::from_node(value, registry)?)))
            .collect()
    }

    fn check_sections(policy: KeyPolicy, visiting: &mut Vec<TypeId>) -> Result<(), MappingError> {
        T::check_sections(policy, visiting)
    }
}

/// Raw subtrees pass through unchanged.
impl Convert for Node {
    fn to_node(&self, _registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        Ok(detached(self.clone()))
    }

    fn from_node(node: &Node, _registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        Ok(detached(node.clone()))
    }
}

impl Convert for MapNode {
    fn to_node(&self, _registry: &ConverterRegistry) -> Result<Node, ConvertError> {
        Ok(Node::map(self.clone()))
    }

    fn from_node(node: &Node, _registry: &ConverterRegistry) -> Result<Self, ConvertError> {
        match detached(node.clone()).into_kind() {
            NodeKind::Map(map) => Ok(map),
            _ => Err(ConvertError::conversion(
                "map",
                node,
                format!("expected a map, found a {} node", node.kind_name()),
            )),
        }
    }
}

fn detached(mut node: Node) -> Node {
    crate::node::detach(&mut node);
    node
}
