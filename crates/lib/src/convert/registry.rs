//! Converter lookup.
//!
//! A [`ConverterRegistry`] is assembled with a [`ConverterRegistryBuilder`]
//! and frozen by [`ConverterRegistryBuilder::build`]; after that it is only
//! read, and can be shared between threads behind an `Arc`.
//!
//! Lookup for a type runs in this order:
//!
//! 1. a converter registered locally for the exact type;
//! 2. the locally registered converter for the nearest declared ancestor
//!    (two ancestors at the same nearest distance is a configuration error);
//! 3. the fallback registry, if any, with the same rules;
//! 4. [`ConvertError::NoConverterFound`].
//!
//! Results of steps 2 and 3 are cached per type.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, trace};

use super::{Convert, ConvertError, TypeDescriptor, TypeKey, TypeRef, builtin};
use crate::node::{KeyPolicy, Node};

/// Converts values of one type (or type family) to nodes and back.
///
/// `ty` describes the concrete type being converted, which matters for
/// converters registered under a supertype or capability.
pub trait Converter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn to_node(
        &self,
        value: &dyn Any,
        ty: &TypeDescriptor,
        registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError>;

    fn from_node(
        &self,
        node: &Node,
        ty: &TypeDescriptor,
        registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError>;
}

type ToNodeFn<T> = dyn Fn(&T) -> Result<Node, ConvertError> + Send + Sync;
type FromNodeFn<T> = dyn Fn(&Node) -> Result<T, ConvertError> + Send + Sync;

/// A [`Converter`] for a single concrete type, built from two closures.
pub struct FnConverter<T> {
    name: String,
    to: Box<ToNodeFn<T>>,
    from: Box<FromNodeFn<T>>,
    _type: PhantomData<fn() -> T>,
}

impl<T: 'static> FnConverter<T> {
    pub fn new<F, G>(name: impl Into<String>, to: F, from: G) -> Self
    where
        F: Fn(&T) -> Result<Node, ConvertError> + Send + Sync + 'static,
        G: Fn(&Node) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            to: Box::new(to),
            from: Box::new(from),
            _type: PhantomData,
        }
    }
}

impl<T: 'static> Converter for FnConverter<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_node(
        &self,
        value: &dyn Any,
        _ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| ConvertError::TypeMismatch {
                converter: self.name.clone(),
                expected: std::any::type_name::<T>().to_string(),
            })?;
        (self.to)(value)
    }

    fn from_node(
        &self,
        node: &Node,
        _ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        Ok(Box::new((self.from)(node)?))
    }
}

/// Collects converters, then freezes them into a [`ConverterRegistry`].
#[derive(Default)]
pub struct ConverterRegistryBuilder {
    converters: HashMap<TypeKey, Arc<dyn Converter>>,
    declared: HashMap<String, TypeDescriptor>,
    fallback: Option<Arc<ConverterRegistry>>,
    key_policy: KeyPolicy,
}

impl ConverterRegistryBuilder {
    /// A builder with no converters at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the built-in converters.
    pub fn with_builtins() -> Self {
        builtin::register(Self::new())
    }

    /// Registers `converter` for `key`, replacing any earlier registration.
    pub fn register(mut self, key: TypeKey, converter: impl Converter + 'static) -> Self {
        self.converters.insert(key, Arc::new(converter));
        self
    }

    /// Registers a shared converter instance.
    pub fn register_arc(mut self, key: TypeKey, converter: Arc<dyn Converter>) -> Self {
        self.converters.insert(key, converter);
        self
    }

    /// Registers a pair of closures as the converter for `T`.
    pub fn register_fn<T, F, G>(self, name: impl Into<String>, to: F, from: G) -> Self
    where
        T: 'static,
        F: Fn(&T) -> Result<Node, ConvertError> + Send + Sync + 'static,
        G: Fn(&Node) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        self.register(TypeKey::of::<T>(), FnConverter::new(name, to, from))
    }

    /// Makes `T` resolvable by name for [`TypeRef`] values.
    pub fn declare<T: Convert>(mut self) -> Self {
        let descriptor = T::descriptor();
        self.declared
            .insert(descriptor.name().to_string(), descriptor);
        self
    }

    /// Registry consulted when no local converter matches.
    pub fn with_fallback(mut self, fallback: Arc<ConverterRegistry>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Key policy used for the maps produced through this registry.
    pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    pub fn build(self) -> ConverterRegistry {
        debug!(
            converters = self.converters.len(),
            declared = self.declared.len(),
            has_fallback = self.fallback.is_some(),
            key_policy = ?self.key_policy,
            "Converter registry frozen"
        );
        ConverterRegistry {
            converters: self.converters,
            declared: self.declared,
            fallback: self.fallback,
            key_policy: self.key_policy,
            resolved: RwLock::new(HashMap::new()),
            sections: RwLock::new(HashMap::new()),
        }
    }
}

/// A frozen set of converters, with an optional fallback registry.
pub struct ConverterRegistry {
    converters: HashMap<TypeKey, Arc<dyn Converter>>,
    declared: HashMap<String, TypeDescriptor>,
    fallback: Option<Arc<ConverterRegistry>>,
    key_policy: KeyPolicy,
    /// Converters resolved through ancestry or fallback, by type
    resolved: RwLock<HashMap<TypeKey, Arc<dyn Converter>>>,
    /// Built section descriptors, by section type
    sections: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ConverterRegistry {
    /// A registry holding the built-in converters.
    pub fn new() -> Self {
        ConverterRegistryBuilder::with_builtins().build()
    }

    /// An empty builder.
    pub fn builder() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder::new()
    }

    pub fn key_policy(&self) -> KeyPolicy {
        self.key_policy
    }

    pub fn fallback(&self) -> Option<&Arc<ConverterRegistry>> {
        self.fallback.as_ref()
    }

    /// Selects the converter for `ty`.
    ///
    /// # Errors
    /// [`ConvertError::NoConverterFound`] when nothing in the chain matches,
    /// [`ConvertError::AmbiguousConverter`] when two ancestors tie.
    pub fn match_converter(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Converter>, ConvertError> {
        let key = ty.key();
        if let Some(converter) = self.converters.get(&key) {
            return Ok(Arc::clone(converter));
        }
        if let Some(converter) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(converter));
        }

        let converter = match self.match_ancestor(ty)? {
            Some(converter) => converter,
            None => match &self.fallback {
                Some(fallback) => {
                    debug!(type_name = ty.name(), "Delegating converter lookup to fallback registry");
                    fallback.match_converter(ty)?
                }
                None => {
                    return Err(ConvertError::NoConverterFound {
                        type_name: ty.name().to_string(),
                    });
                }
            },
        };

        debug!(
            type_name = ty.name(),
            converter = converter.name(),
            "Caching resolved converter"
        );
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&converter));
        Ok(converter)
    }

    fn match_ancestor(
        &self,
        ty: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Converter>>, ConvertError> {
        let mut best: Option<u32> = None;
        let mut candidates: Vec<(TypeKey, &Arc<dyn Converter>)> = Vec::new();
        for ancestor in ty.ancestors() {
            let Some(converter) = self.converters.get(&ancestor.key) else {
                continue;
            };
            match best {
                Some(distance) if ancestor.distance > distance => {}
                Some(distance) if ancestor.distance == distance => {
                    candidates.push((ancestor.key, converter));
                }
                _ => {
                    best = Some(ancestor.distance);
                    candidates = vec![(ancestor.key, converter)];
                }
            }
        }
        match candidates.as_slice() {
            [] => Ok(None),
            [(key, converter)] => {
                trace!(type_name = ty.name(), ancestor = %key, "Matched converter through ancestor");
                Ok(Some(Arc::clone(converter)))
            }
            _ => Err(ConvertError::AmbiguousConverter {
                type_name: ty.name().to_string(),
                candidates: candidates.iter().map(|(key, _)| key.to_string()).collect(),
                distance: best.unwrap_or_default(),
            }),
        }
    }

    /// Converts `value` to a node.
    pub fn convert_to_node<T: Convert>(&self, value: &T) -> Result<Node, ConvertError> {
        value.to_node(self)
    }

    /// Converts a node to a `T`. A null node yields `Ok(None)`.
    pub fn convert_from_node<T: Convert>(&self, node: &Node) -> Result<Option<T>, ConvertError> {
        if node.is_null() {
            return Ok(None);
        }
        T::from_node(node, self).map(Some)
    }

    /// Converts through the converter selected for `ty`.
    pub fn dispatch_to_node(
        &self,
        value: &dyn Any,
        ty: &TypeDescriptor,
    ) -> Result<Node, ConvertError> {
        self.match_converter(ty)?.to_node(value, ty, self)
    }

    /// Converts through the converter selected for `ty` and downcasts the
    /// result.
    pub fn dispatch_from_node<T: 'static>(
        &self,
        node: &Node,
        ty: &TypeDescriptor,
    ) -> Result<T, ConvertError> {
        let converter = self.match_converter(ty)?;
        if let Some(message) = node.error_message() {
            return Err(ConvertError::conversion(
                converter.name(),
                node,
                format!("node holds an earlier failure: {message}"),
            ));
        }
        converter
            .from_node(node, ty, self)?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ConvertError::TypeMismatch {
                converter: converter.name().to_string(),
                expected: ty.name().to_string(),
            })
    }

    /// Resolves a type declared with [`ConverterRegistryBuilder::declare`]
    /// here or in the fallback chain.
    pub fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        let name = name.trim();
        match self.declared.get(name) {
            Some(descriptor) => Some(TypeRef::from_descriptor(descriptor.clone())),
            None => self
                .fallback
                .as_ref()
                .and_then(|fallback| fallback.resolve_type(name)),
        }
    }

    /// Returns the cached value of type `D`, building it with `build` on first
    /// use. Used for section descriptors, which are immutable once built.
    pub(crate) fn cached_section<D, F, E>(&self, build: F) -> Result<Arc<D>, E>
    where
        D: Any + Send + Sync,
        F: FnOnce() -> Result<D, E>,
    {
        let id = TypeId::of::<D>();
        let cached = self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(descriptor) = cached.and_then(|cached| cached.downcast::<D>().ok()) {
            return Ok(descriptor);
        }
        let descriptor = Arc::new(build()?);
        self.sections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&descriptor) as Arc<dyn Any + Send + Sync>);
        Ok(descriptor)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.converters.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &keys)
            .field("key_policy", &self.key_policy)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
