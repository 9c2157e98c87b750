//! Mapping between sections and map node trees.
//!
//! A [`Section`] is a struct whose persisted fields are listed in a
//! [`Fields`] table. The [`StructuralMapper`] walks that table to build a
//! [`MapNode`] from a live instance ([`StructuralMapper::convert`]) or to
//! assign a live instance from a tree ([`StructuralMapper::fill`]).
//!
//! ```
//! use cfgtree::convert::ConverterRegistry;
//! use cfgtree::mapper::{Fields, Section, StructuralMapper};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Pool {
//!     max_size: u32,
//!     idle_timeout: u64,
//! }
//!
//! impl Section for Pool {
//!     fn describe(fields: &mut Fields<Self>) {
//!         fields.field("maxSize", |s| &s.max_size, |s| &mut s.max_size);
//!         fields.field("idle_timeout", |s| &s.idle_timeout, |s| &mut s.idle_timeout);
//!     }
//! }
//!
//! let registry = ConverterRegistry::new();
//! let mapper = StructuralMapper::new(&registry);
//!
//! let tree = mapper.convert(&Pool { max_size: 8, idle_timeout: 30 })?;
//! assert_eq!(tree.keys().collect::<Vec<_>>(), ["max-size", "idle"]);
//!
//! let mut pool = Pool::default();
//! let report = mapper.fill(&tree, &mut pool)?;
//! assert!(report.inherited().is_empty());
//! assert_eq!(pool, Pool { max_size: 8, idle_timeout: 30 });
//! # Ok::<(), cfgtree::mapper::MappingError>(())
//! ```

use std::{any::Any, sync::Arc};

use tracing::{trace, warn};

use crate::{
    convert::{ConvertError, ConverterRegistry, SectionShape},
    node::{Container, MapNode, Node, NodeError},
    path::Path,
};

pub mod descriptor;
pub mod errors;
pub mod naming;

use descriptor::FieldError;
pub(crate) use descriptor::SectionCheck;
pub use descriptor::{FieldSpec, Fields, SectionDescriptor};
pub use errors::MappingError;

/// A struct mapped field by field to a map node.
///
/// To nest a section inside a list or map field, give it a
/// [`Convert`](crate::convert::Convert) impl whose descriptor is
/// [`TypeDescriptor::section`](crate::convert::TypeDescriptor::section);
/// such sections are mapped with default [`MapperOptions`].
pub trait Section: Default + Send + Sync + 'static {
    /// Lists the persisted fields, in mapping order.
    fn describe(fields: &mut Fields<Self>);
}

/// Behavior on per-field conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperOptions {
    /// Abort on the first failing field. When unset, a failing field becomes
    /// an error node (convert) or a report entry (fill) and mapping continues.
    pub fail_fast: bool,
}

impl MapperOptions {
    pub fn best_effort() -> Self {
        Self { fail_fast: false }
    }
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self { fail_fast: true }
    }
}

/// A field that failed to fill in best-effort mode.
#[derive(Debug)]
pub struct FieldFailure {
    pub path: Path,
    pub error: ConvertError,
}

/// Outcome of [`StructuralMapper::fill`].
#[derive(Debug, Default)]
pub struct FillReport {
    inherited: Vec<Path>,
    failures: Vec<FieldFailure>,
}

impl FillReport {
    /// Field paths that had no node and kept their current value.
    pub fn inherited(&self) -> &[Path] {
        &self.inherited
    }

    /// Fields that failed to convert; always empty in fail-fast mode.
    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// Returns `true` if every field was either assigned or inherited.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_inherited(&self, path: &Path) -> bool {
        self.inherited.contains(path)
    }

    /// Flags the nodes of `map` at inherited paths, typically a tree just
    /// converted from the filled section.
    pub fn mark_inherited(&self, map: &mut MapNode) {
        for path in &self.inherited {
            if let Ok(Some(node)) = map.get_mut(path) {
                node.set_inherited(true);
            }
        }
    }

    fn absorb(&mut self, prefix: &Path, nested: FillReport) {
        self.inherited.extend(
            nested
                .inherited
                .into_iter()
                .map(|path| prefix.clone().join(&path)),
        );
        self.failures
            .extend(nested.failures.into_iter().map(|failure| FieldFailure {
                path: prefix.clone().join(&failure.path),
                error: failure.error,
            }));
    }
}

/// Converts sections to trees and fills sections from trees.
#[derive(Debug, Clone, Copy)]
pub struct StructuralMapper<'r> {
    registry: &'r ConverterRegistry,
    options: MapperOptions,
}

impl<'r> StructuralMapper<'r> {
    /// A fail-fast mapper over `registry`.
    pub fn new(registry: &'r ConverterRegistry) -> Self {
        Self::with_options(registry, MapperOptions::default())
    }

    pub fn with_options(registry: &'r ConverterRegistry, options: MapperOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &'r ConverterRegistry {
        self.registry
    }

    pub fn options(&self) -> MapperOptions {
        self.options
    }

    /// Returns the validated descriptor of `S`, built once per registry.
    ///
    /// # Errors
    /// [`MappingError::DuplicatedPath`] if two fields share a normalized path.
    pub fn descriptor<S: Section>(&self) -> Result<Arc<SectionDescriptor<S>>, MappingError> {
        let policy = self.registry.key_policy();
        self.registry
            .cached_section(|| SectionDescriptor::<S>::build(policy))
    }

    /// Builds a map node from the fields of `section`.
    ///
    /// Fields whose value converts to null are left out. A field whose
    /// value is a map lands on top of a map already placed at the same path
    /// by another field, as long as their keys do not overlap.
    pub fn convert<S: Section>(&self, section: &S) -> Result<MapNode, MappingError> {
        let descriptor = self.descriptor::<S>()?;
        let mut map = MapNode::with_policy(self.registry.key_policy());
        for field in descriptor.fields() {
            trace!(section = descriptor.name(), field = field.ident(), path = %field.resolved_path(), "Converting field");
            let node = match field.access.read(section, self) {
                Ok(node) => node,
                Err(err) => self.recover_read(descriptor.name(), field, err)?,
            };
            if node.is_null() {
                continue;
            }
            place(&mut map, field.resolved_path(), decorate(node, field))?;
        }
        Ok(map)
    }

    /// Assigns the fields of `section` from `map`.
    ///
    /// A field without a node keeps its current value and is listed in the
    /// report as inherited.
    pub fn fill<S: Section>(
        &self,
        map: &MapNode,
        section: &mut S,
    ) -> Result<FillReport, MappingError> {
        let descriptor = self.descriptor::<S>()?;
        let mut report = FillReport::default();
        for field in descriptor.fields() {
            let path = field.resolved_path();
            let outcome = match map.get(path) {
                Ok(Some(node)) => {
                    trace!(section = descriptor.name(), field = field.ident(), path = %path, "Filling field");
                    field.access.write(section, node, self)
                }
                Ok(None) => {
                    trace!(section = descriptor.name(), field = field.ident(), path = %path, "No node, keeping current value");
                    report.inherited.push(path.clone());
                    continue;
                }
                // A scalar where the field expects to descend is bad data
                Err(err) => Err(FieldError::Convert(
                    ConvertError::conversion("mapper", path, err.to_string()).with_source(err),
                )),
            };
            match outcome {
                Ok(nested) => report.absorb(path, nested),
                Err(FieldError::Convert(error)) if self.skips(&error) => {
                    warn!(section = descriptor.name(), field = field.ident(), path = %path, error = %error, "Skipping field that failed to convert");
                    report.failures.push(FieldFailure {
                        path: path.clone(),
                        error,
                    });
                }
                Err(err) => return Err(field_error(field, err)),
            }
        }
        Ok(report)
    }

    /// Default-constructs an `S` and fills it from `map`.
    pub fn load<S: Section>(&self, map: &MapNode) -> Result<S, MappingError> {
        let mut section = S::default();
        self.fill(map, &mut section)?;
        Ok(section)
    }

    /// Best-effort mode skips bad data only; lookup failures still abort.
    fn skips(&self, error: &ConvertError) -> bool {
        !self.options.fail_fast && error.is_recoverable()
    }

    fn recover_read<S: Section>(
        &self,
        section: &str,
        field: &FieldSpec<S>,
        err: FieldError,
    ) -> Result<Node, MappingError> {
        match err {
            FieldError::Convert(error) if self.skips(&error) => {
                warn!(section, field = field.ident(), path = %field.resolved_path(), error = %error, "Writing error node for field that failed to convert");
                Ok(Node::error(error.to_string()))
            }
            err => Err(field_error(field, err)),
        }
    }
}

fn field_error<S: Section>(field: &FieldSpec<S>, err: FieldError) -> MappingError {
    let path = field.resolved_path().clone();
    match err {
        FieldError::Convert(source) => MappingError::Conversion { path, source },
        FieldError::Access(reason) => MappingError::FieldAccess {
            path,
            section: field.owner().to_string(),
            field: field.ident().to_string(),
            reason,
        },
        FieldError::Mapping(nested) => nested.under(&path),
    }
}

/// Attaches field comments and map entry comments to a converted node.
fn decorate<S: Section>(mut node: Node, field: &FieldSpec<S>) -> Node {
    if !field.comments().is_empty() {
        node.set_comments(field.comments().iter().cloned());
    }
    if let Some(map) = node.as_map_mut() {
        for (sub_path, lines) in field.map_comments() {
            match map.get_mut(sub_path) {
                Ok(Some(entry)) => entry.set_comments(lines.iter().cloned()),
                _ => trace!(field = field.ident(), entry = %sub_path, "No entry for map comment"),
            }
        }
    }
    node
}

/// Inserts `node` at `path`, merging it into a map already there.
fn place(map: &mut MapNode, path: &Path, node: Node) -> Result<(), NodeError> {
    let mergeable =
        node.as_map().is_some() && map.get(path)?.is_some_and(|existing| existing.as_map().is_some());
    if !mergeable {
        return map.insert(path, node);
    }
    let Some(existing) = map.get_mut(path)? else {
        return Ok(());
    };
    if existing.comments().is_empty() {
        existing.set_comments(node.comments().iter().cloned());
    }
    match (existing.as_map_mut(), node.into_map()) {
        (Some(existing), Some(incoming)) => existing.merge_disjoint(incoming),
        _ => Ok(()),
    }
}

/// Entry points used by the section converter for sections nested in
/// collections.
pub(crate) fn section_shape<S: Section>() -> SectionShape {
    SectionShape {
        to_node: |value: &dyn Any, registry: &ConverterRegistry| {
            let section = value
                .downcast_ref::<S>()
                .ok_or_else(|| ConvertError::TypeMismatch {
                    converter: "section".to_string(),
                    expected: std::any::type_name::<S>().to_string(),
                })?;
            StructuralMapper::new(registry)
                .convert(section)
                .map(Node::map)
                .map_err(|e| ConvertError::Section(Box::new(e)))
        },
        from_node: |node: &Node, registry: &ConverterRegistry| {
            let map = node.as_map().ok_or_else(|| {
                ConvertError::conversion(
                    "section",
                    node,
                    format!("expected a map, found a {} node", node.kind_name()),
                )
            })?;
            let section: S = StructuralMapper::new(registry)
                .load(map)
                .map_err(|e| ConvertError::Section(Box::new(e)))?;
            Ok(Box::new(section) as Box<dyn Any>)
        },
        check: descriptor::check_section::<S>,
    }
}
