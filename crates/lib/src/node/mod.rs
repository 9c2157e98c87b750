//! The typed node tree.
//!
//! A configuration tree is built from [`Node`]s. Each node is one of five
//! kinds ([`NodeKind`]): a [`Scalar`] leaf, a [`ListNode`], a [`MapNode`], a
//! null, or an error placeholder. Any node may carry comment lines and an
//! `inherited` flag marking a value that came from a default rather than from
//! explicit configuration.
//!
//! # Ownership
//!
//! Trees are owned strictly top-down. The link from a child back to its parent
//! ([`ParentLink`]) is a plain location record: the path of the parent
//! container plus the key under which the child is stored. It is stamped when a
//! node is inserted and re-stamped when a container moves under a new parent, so
//! a node can always report where it lives without holding a reference to its
//! parent.
//!
//! # Usage
//!
//! ```
//! use cfgtree::node::{Container, MapNode, Node};
//! use cfgtree::path::Path;
//!
//! let mut root = MapNode::new();
//! root.set(&Path::from("Server.Port"), Node::from(8080))?;
//!
//! let port = root.get(&Path::from("server.port"))?.unwrap();
//! assert_eq!(port.as_text()?, "8080");
//! assert_eq!(port.path().unwrap().to_string(), "Server.Port");
//! # Ok::<(), cfgtree::node::NodeError>(())
//! ```

use std::fmt;

use crate::path::Path;

pub mod errors;
pub mod list;
pub mod map;
pub mod scalar;
mod serde_impl;

pub use errors::NodeError;
pub use list::ListNode;
pub use map::{KeyPolicy, MapNode};
pub use scalar::Scalar;
pub use serde_impl::NodeSeed;

/// The variant payload of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Typed leaf value
    Scalar(Scalar),
    /// Ordered, 0-indexed collection
    List(ListNode),
    /// Keyed collection
    Map(MapNode),
    /// Explicit absence of a value
    Null,
    /// Placeholder for a value that failed to convert; holds the diagnostic
    Error(String),
}

impl NodeKind {
    /// Returns the kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::List(_) => "list",
            NodeKind::Map(_) => "map",
            NodeKind::Null => "null",
            NodeKind::Error(_) => "error",
        }
    }
}

/// Where a node is attached: the parent container's location and the key (or
/// list index) the node is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    parent: Path,
    key: String,
}

impl ParentLink {
    /// Location of the containing node, relative to the tree root.
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// The key as originally written (or the list index).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The full location of the linked node.
    pub fn path(&self) -> Path {
        self.parent.clone().push(self.key.clone())
    }
}

/// A node in a configuration tree.
///
/// Equality compares kind, comments and the inherited flag; parent links are
/// positional bookkeeping and are ignored.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    comments: Vec<String>,
    inherited: bool,
    parent: Option<ParentLink>,
}

impl Node {
    /// Creates a detached node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            comments: Vec::new(),
            inherited: false,
            parent: None,
        }
    }

    /// Creates a scalar node.
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::new(NodeKind::Scalar(value.into()))
    }

    /// Creates a null node.
    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    /// Creates an error placeholder carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NodeKind::Error(message.into()))
    }

    /// Wraps a list.
    pub fn list(list: ListNode) -> Self {
        Self::new(NodeKind::List(list))
    }

    /// Wraps a map.
    pub fn map(map: MapNode) -> Self {
        Self::new(NodeKind::Map(map))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Consumes the node, returning its payload.
    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    /// Returns the kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Comment lines attached to this node.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Replaces the comment lines.
    pub fn set_comments<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comments = lines.into_iter().map(Into::into).collect();
    }

    /// Appends one comment line.
    pub fn add_comment(&mut self, line: impl Into<String>) {
        self.comments.push(line.into());
    }

    /// Builder variant of [`Node::set_comments`].
    pub fn with_comments<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_comments(lines);
        self
    }

    /// Returns `true` if the value is a default rather than explicitly set.
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn set_inherited(&mut self, inherited: bool) {
        self.inherited = inherited;
    }

    /// The non-owning link to the containing node, if attached.
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// The location of this node relative to its tree root, rebuilt from the
    /// parent link. `None` for detached nodes and roots.
    pub fn path(&self) -> Option<Path> {
        self.parent.as_ref().map(ParentLink::path)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(_))
    }

    /// Returns `true` for map and list nodes.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Map(_) | NodeKind::List(_))
    }

    /// The typed scalar value, if this is a scalar node.
    pub fn value(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// The canonical text of a scalar node.
    ///
    /// # Errors
    /// [`NodeError::NoTextForm`] for containers, null and error nodes.
    pub fn as_text(&self) -> Result<String, NodeError> {
        match &self.kind {
            NodeKind::Scalar(scalar) => Ok(scalar.as_text()),
            other => Err(NodeError::NoTextForm { kind: other.name() }),
        }
    }

    /// The diagnostic of an error node.
    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapNode> {
        match &self.kind {
            NodeKind::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapNode> {
        match &mut self.kind {
            NodeKind::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match &self.kind {
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListNode> {
        match &mut self.kind {
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Consumes the node, returning the map if it is one.
    pub fn into_map(self) -> Option<MapNode> {
        match self.kind {
            NodeKind::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Views a map or list node through the [`Container`] contract.
    pub fn as_container(&self) -> Option<&dyn Container> {
        match &self.kind {
            NodeKind::Map(map) => Some(map),
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        match &mut self.kind {
            NodeKind::Map(map) => Some(map),
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Like [`Node::as_container_mut`] but reports a scalar intermediate as
    /// [`NodeError::InvalidPath`].
    fn container_or_invalid(&mut self) -> Result<&mut dyn Container, NodeError> {
        if !self.is_container() {
            return Err(invalid_path(self));
        }
        match &mut self.kind {
            NodeKind::Map(map) => Ok(map),
            NodeKind::List(list) => Ok(list),
            other => Err(NodeError::InvalidPath {
                path: String::new(),
                kind: other.name(),
            }),
        }
    }

    /// Returns `true` for containers with no remaining children.
    fn is_empty_container(&self) -> bool {
        self.as_container().is_some_and(|container| container.is_empty())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.comments == other.comments
            && self.inherited == other.inherited
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Scalar(scalar) => write!(f, "{scalar}"),
            NodeKind::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            NodeKind::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            NodeKind::Null => write!(f, "null"),
            NodeKind::Error(message) => write!(f, "<error: {message}>"),
        }
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Node::new(kind)
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::scalar(value)
    }
}

impl From<MapNode> for Node {
    fn from(value: MapNode) -> Self {
        Node::map(value)
    }
}

impl From<ListNode> for Node {
    fn from(value: ListNode) -> Self {
        Node::list(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::scalar(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::scalar(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::scalar(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::scalar(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::scalar(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::scalar(value)
    }
}

/// The contract shared by map and list nodes.
///
/// Implementors supply the single-segment primitives; path traversal is
/// provided on top of them. Descending through an existing non-container node
/// fails with [`NodeError::InvalidPath`]; a missing intermediate makes `get`
/// and `remove` report absence and makes `set`/`insert` create a map.
pub trait Container {
    /// This container's location relative to its tree root.
    fn location(&self) -> &Path;

    /// Number of live children.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a direct child by one segment, without traversal.
    fn get_exact(&self, segment: &str) -> Result<Option<&Node>, NodeError>;

    fn get_exact_mut(&mut self, segment: &str) -> Result<Option<&mut Node>, NodeError>;

    /// Stores a direct child, replacing any previous one.
    fn set_exact(&mut self, segment: &str, node: Node) -> Result<Option<Node>, NodeError>;

    /// Stores a direct child, failing if the segment is already occupied.
    fn insert_exact(&mut self, segment: &str, node: Node) -> Result<(), NodeError>;

    fn remove_exact(&mut self, segment: &str) -> Result<Option<Node>, NodeError>;

    /// Returns the child at `segment`, creating an empty map there if missing.
    fn get_or_create_exact(&mut self, segment: &str) -> Result<&mut Node, NodeError>;

    /// Depth-first: cleans every child container, then drops the ones left
    /// empty.
    fn clean_up_empty_nodes(&mut self);

    /// Moves this container to `location`, re-stamping every descendant link.
    fn relocate(&mut self, location: Path);

    /// Returns the node stored at `path`, or `None` if any segment is missing.
    fn get(&self, path: &Path) -> Result<Option<&Node>, NodeError> {
        let (first, rest) = split(path, "get")?;
        let Some(child) = self.get_exact(first)? else {
            return Ok(None);
        };
        match rest {
            None => Ok(Some(child)),
            Some(rest) => match child.as_container() {
                Some(container) => container.get(&rest),
                None => Err(invalid_path(child)),
            },
        }
    }

    fn get_mut(&mut self, path: &Path) -> Result<Option<&mut Node>, NodeError> {
        let (first, rest) = split(path, "get")?;
        let Some(child) = self.get_exact_mut(first)? else {
            return Ok(None);
        };
        match rest {
            None => Ok(Some(child)),
            Some(rest) => child.container_or_invalid()?.get_mut(&rest),
        }
    }

    /// Stores `node` at `path`, creating intermediate maps as needed. Returns
    /// the node previously stored there.
    fn set(&mut self, path: &Path, node: Node) -> Result<Option<Node>, NodeError> {
        let (first, rest) = split(path, "set")?;
        match rest {
            None => self.set_exact(first, node),
            Some(rest) => self
                .get_or_create_exact(first)?
                .container_or_invalid()?
                .set(&rest, node),
        }
    }

    /// Like [`Container::set`] but fails if the final segment is occupied.
    fn insert(&mut self, path: &Path, node: Node) -> Result<(), NodeError> {
        let (first, rest) = split(path, "insert")?;
        match rest {
            None => self.insert_exact(first, node),
            Some(rest) => self
                .get_or_create_exact(first)?
                .container_or_invalid()?
                .insert(&rest, node),
        }
    }

    /// Removes and returns the node stored at `path`.
    fn remove(&mut self, path: &Path) -> Result<Option<Node>, NodeError> {
        let (first, rest) = split(path, "remove")?;
        match rest {
            None => self.remove_exact(first),
            Some(rest) => match self.get_exact_mut(first)? {
                None => Ok(None),
                Some(child) => child.container_or_invalid()?.remove(&rest),
            },
        }
    }
}

/// Splits a path into its first segment and the remainder (`None` when base).
fn split<'p>(
    path: &'p Path,
    operation: &'static str,
) -> Result<(&'p str, Option<Path>), NodeError> {
    let first = path.first().ok_or(NodeError::EmptyPath { operation })?;
    let rest = if path.is_base_path() {
        None
    } else {
        Some(Path::new(path.segments()[1..].iter().cloned()))
    };
    Ok((first, rest))
}

fn invalid_path(node: &Node) -> NodeError {
    NodeError::InvalidPath {
        path: describe_location(node.path().as_ref()),
        kind: node.kind_name(),
    }
}

pub(crate) fn describe_location(path: Option<&Path>) -> String {
    match path {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => "(root)".to_string(),
    }
}

/// Stamps `node` as stored under `key` in the container at `parent`.
pub(crate) fn attach(node: &mut Node, parent: &Path, key: &str) {
    node.parent = Some(ParentLink {
        parent: parent.clone(),
        key: key.to_string(),
    });
    if let Some(container) = node.as_container_mut() {
        container.relocate(parent.clone().push(key));
    }
}

/// Hands the key policy of a container to a list stored in it. Maps keep
/// their own policy.
pub(crate) fn adopt_policy(node: &mut Node, policy: KeyPolicy) {
    if let Some(list) = node.as_list_mut() {
        list.adopt_policy(policy);
    }
}

/// Clears the link of a node that left its container.
pub(crate) fn detach(node: &mut Node) {
    node.parent = None;
    if let Some(container) = node.as_container_mut() {
        container.relocate(Path::empty());
    }
}
