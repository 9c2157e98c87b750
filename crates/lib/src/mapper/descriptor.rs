//! Declarative field tables for sections.
//!
//! A [`Section`] describes its persisted fields once, through [`Fields`]. Each
//! entry pairs accessors for the field with its metadata: the identifier, the
//! resolved path, comment lines and comments for entries inside a map-valued
//! field. The mapper walks the resulting [`SectionDescriptor`] instead of
//! inspecting values at runtime.

use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    fmt,
};

use tracing::debug;

use super::{FillReport, MappingError, Section, StructuralMapper, naming};
use crate::{
    convert::{Convert, ConvertError},
    node::{KeyPolicy, MapNode, Node},
    path::{DEFAULT_DELIMITER, Path},
};

/// Validates the field table of a section type and of the sections nested in
/// it. `visiting` holds the section types already being checked, so
/// recursive types terminate.
pub(crate) type SectionCheck = fn(KeyPolicy, &mut Vec<TypeId>) -> Result<(), MappingError>;

/// Checks `S` and everything reachable from its fields, whether or not any
/// value of those types exists yet.
pub(crate) fn check_section<S: Section>(
    policy: KeyPolicy,
    visiting: &mut Vec<TypeId>,
) -> Result<(), MappingError> {
    let id = TypeId::of::<S>();
    if visiting.contains(&id) {
        return Ok(());
    }
    let mut fields = Fields::<S>::new();
    S::describe(&mut fields);
    check_paths(type_name::<S>(), &fields.specs, policy)?;

    visiting.push(id);
    let nested = check_nested(&fields.specs, policy, visiting);
    visiting.pop();
    nested
}

fn check_paths<S>(
    section: &'static str,
    specs: &[FieldSpec<S>],
    policy: KeyPolicy,
) -> Result<(), MappingError> {
    let mut seen: HashMap<Path, &'static str> = HashMap::new();
    for spec in specs {
        let normalized = policy.normalize_path(&spec.path);
        if let Some(first) = seen.insert(normalized, spec.ident) {
            return Err(MappingError::DuplicatedPath {
                section: section.to_string(),
                path: spec.path.clone(),
                first: first.to_string(),
                second: spec.ident.to_string(),
            });
        }
    }
    Ok(())
}

fn check_nested<S>(
    specs: &[FieldSpec<S>],
    policy: KeyPolicy,
    visiting: &mut Vec<TypeId>,
) -> Result<(), MappingError> {
    for spec in specs {
        (spec.check)(policy, visiting).map_err(|e| e.under(&spec.path))?;
    }
    Ok(())
}

/// Why a single field failed.
pub(crate) enum FieldError {
    Convert(ConvertError),
    Access(String),
    Mapping(MappingError),
}

impl From<ConvertError> for FieldError {
    fn from(err: ConvertError) -> Self {
        match err {
            // A nested section that cannot be mapped at all fails the field's
            // section too
            ConvertError::Section(inner) if !inner.is_recoverable() => {
                FieldError::Mapping(*inner)
            }
            err => FieldError::Convert(err),
        }
    }
}

/// Type-erased read/write access to one field of `S`.
pub(crate) trait FieldAccess<S>: Send + Sync {
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError>;

    /// Assigns the field from `node`. Returns what nested sections left
    /// untouched, relative to the field.
    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError>;
}

struct RefField<S, T> {
    get: fn(&S) -> &T,
    get_mut: fn(&mut S) -> &mut T,
}

impl<S, T: Convert> FieldAccess<S> for RefField<S, T> {
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError> {
        Ok((self.get)(section).to_node(mapper.registry())?)
    }

    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError> {
        *(self.get_mut)(section) = T::from_node(node, mapper.registry())?;
        Ok(FillReport::default())
    }
}

struct PropertyField<S, T, E> {
    get: fn(&S) -> T,
    set: fn(&mut S, T) -> Result<(), E>,
}

impl<S, T, E> FieldAccess<S> for PropertyField<S, T, E>
where
    T: Convert,
    E: fmt::Display,
{
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError> {
        Ok((self.get)(section).to_node(mapper.registry())?)
    }

    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError> {
        let value = T::from_node(node, mapper.registry())?;
        (self.set)(section, value).map_err(|e| FieldError::Access(e.to_string()))?;
        Ok(FillReport::default())
    }
}

fn expect_map(node: &Node) -> Result<&MapNode, FieldError> {
    node.as_map().ok_or_else(|| {
        FieldError::Convert(ConvertError::conversion(
            "section",
            node,
            format!("expected a map, found a {} node", node.kind_name()),
        ))
    })
}

struct NestedField<S, N> {
    get: fn(&S) -> &N,
    get_mut: fn(&mut S) -> &mut N,
}

impl<S, N: Section> FieldAccess<S> for NestedField<S, N> {
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError> {
        mapper
            .convert((self.get)(section))
            .map(Node::map)
            .map_err(FieldError::Mapping)
    }

    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError> {
        mapper
            .fill(expect_map(node)?, (self.get_mut)(section))
            .map_err(FieldError::Mapping)
    }
}

struct OptionalNestedField<S, N> {
    get: fn(&S) -> &Option<N>,
    get_mut: fn(&mut S) -> &mut Option<N>,
    construct: fn(&S) -> N,
}

impl<S, N: Section> FieldAccess<S> for OptionalNestedField<S, N> {
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError> {
        match (self.get)(section) {
            Some(nested) => mapper
                .convert(nested)
                .map(Node::map)
                .map_err(FieldError::Mapping),
            None => Ok(Node::null()),
        }
    }

    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError> {
        let map = expect_map(node)?;
        if (self.get)(section).is_none() {
            let fresh = (self.construct)(section);
            *(self.get_mut)(section) = Some(fresh);
        }
        match (self.get_mut)(section) {
            Some(nested) => mapper.fill(map, nested).map_err(FieldError::Mapping),
            None => Ok(FillReport::default()),
        }
    }
}

/// A field of a base section, reached through the derived section.
struct ProjectedField<S, B> {
    inner: Box<dyn FieldAccess<B>>,
    get: fn(&S) -> &B,
    get_mut: fn(&mut S) -> &mut B,
}

impl<S, B: 'static> FieldAccess<S> for ProjectedField<S, B> {
    fn read(&self, section: &S, mapper: &StructuralMapper<'_>) -> Result<Node, FieldError> {
        self.inner.read((self.get)(section), mapper)
    }

    fn write(
        &self,
        section: &mut S,
        node: &Node,
        mapper: &StructuralMapper<'_>,
    ) -> Result<FillReport, FieldError> {
        self.inner.write((self.get_mut)(section), node, mapper)
    }
}

/// One persisted field and its metadata.
pub struct FieldSpec<S> {
    ident: &'static str,
    owner: &'static str,
    path: Path,
    comments: Vec<String>,
    map_comments: Vec<(Path, Vec<String>)>,
    pub(crate) access: Box<dyn FieldAccess<S>>,
    check: SectionCheck,
}

impl<S: 'static> FieldSpec<S> {
    fn new(ident: &'static str, access: Box<dyn FieldAccess<S>>, check: SectionCheck) -> Self {
        Self {
            ident,
            owner: type_name::<S>(),
            path: naming::derive_path(ident),
            comments: Vec::new(),
            map_comments: Vec::new(),
            access,
            check,
        }
    }

    /// Overrides the derived path. `.` separates segments.
    pub fn path(&mut self, path: &str) -> &mut Self {
        self.path = Path::parse(path, DEFAULT_DELIMITER);
        self
    }

    /// Appends a comment line rendered above the field.
    pub fn comment(&mut self, line: impl Into<String>) -> &mut Self {
        self.comments.push(line.into());
        self
    }

    /// Documents an entry inside a map-valued field. `sub_path` is relative
    /// to the field; the comment is attached only when the entry exists.
    pub fn map_comment<I, L>(&mut self, sub_path: &str, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.map_comments.push((
            Path::parse(sub_path, DEFAULT_DELIMITER),
            lines.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Name of the section type that declared the field.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn resolved_path(&self) -> &Path {
        &self.path
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn map_comments(&self) -> &[(Path, Vec<String>)] {
        &self.map_comments
    }

    fn project<D: 'static>(self, get: fn(&D) -> &S, get_mut: fn(&mut D) -> &mut S) -> FieldSpec<D> {
        FieldSpec {
            ident: self.ident,
            owner: self.owner,
            path: self.path,
            comments: self.comments,
            map_comments: self.map_comments,
            access: Box::new(ProjectedField {
                inner: self.access,
                get,
                get_mut,
            }),
            check: self.check,
        }
    }
}

impl<S> fmt::Debug for FieldSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("ident", &self.ident)
            .field("owner", &self.owner)
            .field("path", &self.path)
            .field("comments", &self.comments)
            .finish_non_exhaustive()
    }
}

/// Collects the field table of a section.
///
/// ```
/// use cfgtree::mapper::{Fields, Section};
///
/// #[derive(Default)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Section for Server {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("host", |s| &s.host, |s| &mut s.host);
///         fields
///             .field("port", |s| &s.port, |s| &mut s.port)
///             .comment("TCP port to listen on");
///     }
/// }
/// ```
pub struct Fields<S> {
    specs: Vec<FieldSpec<S>>,
    /// Number of leading specs contributed by base sections
    inherited: usize,
}

impl<S: Section> Fields<S> {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            inherited: 0,
        }
    }

    fn push(
        &mut self,
        ident: &'static str,
        access: Box<dyn FieldAccess<S>>,
        check: SectionCheck,
    ) -> &mut FieldSpec<S> {
        let index = self.specs.len();
        self.specs.push(FieldSpec::new(ident, access, check));
        &mut self.specs[index]
    }

    /// A field reached through references, converted with the registry.
    pub fn field<T: Convert>(
        &mut self,
        ident: &'static str,
        get: fn(&S) -> &T,
        get_mut: fn(&mut S) -> &mut T,
    ) -> &mut FieldSpec<S> {
        self.push(ident, Box::new(RefField { get, get_mut }), T::check_sections)
    }

    /// A field behind a getter and a validating setter. A setter error is a
    /// [`MappingError::FieldAccess`].
    pub fn property<T, E>(
        &mut self,
        ident: &'static str,
        get: fn(&S) -> T,
        set: fn(&mut S, T) -> Result<(), E>,
    ) -> &mut FieldSpec<S>
    where
        T: Convert,
        E: fmt::Display + 'static,
    {
        self.push(ident, Box::new(PropertyField { get, set }), T::check_sections)
    }

    /// A nested section, written as a sub-map and filled in place.
    pub fn section<N: Section>(
        &mut self,
        ident: &'static str,
        get: fn(&S) -> &N,
        get_mut: fn(&mut S) -> &mut N,
    ) -> &mut FieldSpec<S> {
        self.push(
            ident,
            Box::new(NestedField { get, get_mut }),
            check_section::<N>,
        )
    }

    /// A nested section that may be absent. It is default-constructed when
    /// the tree has an entry for it.
    pub fn optional_section<N: Section>(
        &mut self,
        ident: &'static str,
        get: fn(&S) -> &Option<N>,
        get_mut: fn(&mut S) -> &mut Option<N>,
    ) -> &mut FieldSpec<S> {
        self.optional_section_with(ident, get, get_mut, |_| N::default())
    }

    /// Like [`Fields::optional_section`], constructing the nested section from
    /// the enclosing instance.
    pub fn optional_section_with<N: Section>(
        &mut self,
        ident: &'static str,
        get: fn(&S) -> &Option<N>,
        get_mut: fn(&mut S) -> &mut Option<N>,
        construct: fn(&S) -> N,
    ) -> &mut FieldSpec<S> {
        self.push(
            ident,
            Box::new(OptionalNestedField {
                get,
                get_mut,
                construct,
            }),
            check_section::<N>,
        )
    }

    /// Flattens the fields of a base section into this one. Base fields come
    /// before the section's own, whatever the call order.
    pub fn extends<B: Section>(&mut self, get: fn(&S) -> &B, get_mut: fn(&mut S) -> &mut B) {
        let mut base = Fields::<B>::new();
        B::describe(&mut base);
        let own = self.specs.split_off(self.inherited);
        self.inherited += base.specs.len();
        self.specs.extend(
            base.specs
                .into_iter()
                .map(|spec| spec.project(get, get_mut)),
        );
        self.specs.extend(own);
    }
}

/// The validated field table of a section type.
pub struct SectionDescriptor<S> {
    name: &'static str,
    fields: Vec<FieldSpec<S>>,
}

impl<S: Section> SectionDescriptor<S> {
    /// Describes `S` and checks that no two fields share a normalized path,
    /// in `S` and in every section type reachable from its fields.
    pub(crate) fn build(policy: KeyPolicy) -> Result<Self, MappingError> {
        let name = type_name::<S>();
        let mut fields = Fields::<S>::new();
        S::describe(&mut fields);
        check_paths(name, &fields.specs, policy)?;
        check_nested(&fields.specs, policy, &mut vec![TypeId::of::<S>()])?;

        debug!(
            section = name,
            fields = fields.specs.len(),
            "Built section descriptor"
        );
        Ok(Self {
            name,
            fields: fields.specs,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in mapping order, base section fields first.
    pub fn fields(&self) -> &[FieldSpec<S>] {
        &self.fields
    }
}

impl<S> fmt::Debug for SectionDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}
