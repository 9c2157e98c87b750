//! Keyed container nodes.

use std::collections::HashMap;

use super::{Container, Node, NodeError, adopt_policy, attach, describe_location, detach};
use crate::path::Path;

/// How map keys are normalized for storage and lookup.
///
/// The original spelling of every key is kept for rendering either way; the
/// policy only decides which spellings collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyPolicy {
    /// Trim surrounding whitespace and lowercase.
    #[default]
    CaseInsensitive,
    /// Trim surrounding whitespace only.
    Exact,
}

impl KeyPolicy {
    /// Normalizes a single key.
    ///
    /// ```
    /// # use cfgtree::node::KeyPolicy;
    /// assert_eq!(KeyPolicy::CaseInsensitive.normalize(" Foo "), "foo");
    /// assert_eq!(KeyPolicy::Exact.normalize(" Foo "), "Foo");
    /// ```
    pub fn normalize(&self, key: &str) -> String {
        match self {
            KeyPolicy::CaseInsensitive => key.trim().to_lowercase(),
            KeyPolicy::Exact => key.trim().to_string(),
        }
    }

    /// Normalizes every segment of a path.
    pub fn normalize_path(&self, path: &Path) -> Path {
        path.iter().map(|segment| self.normalize(segment)).collect()
    }
}

#[derive(Debug, Clone)]
struct MapEntry {
    /// Key as originally written, used for rendering
    key: String,
    node: Node,
}

/// A map node: ordered entries addressed by normalized keys.
///
/// Entries keep insertion order. Storing a null node is a tombstone: the key
/// is removed and behaves exactly as if it had never been set.
///
/// ```
/// # use cfgtree::node::{MapNode, Node};
/// let mut map = MapNode::new();
/// map.set_exact_node("Foo", Node::from(1));
///
/// assert_eq!(map.get_exact_node("foo"), Some(&Node::from(1)));
/// assert_eq!(map.keys().collect::<Vec<_>>(), ["Foo"]);
///
/// map.set_exact_node("FOO", Node::null());
/// assert!(map.get_exact_node("foo").is_none());
/// assert!(map.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapNode {
    policy: KeyPolicy,
    location: Path,
    entries: Vec<MapEntry>,
    /// Normalized key → position in `entries`
    index: HashMap<String, usize>,
}

impl MapNode {
    /// Creates an empty map with case-insensitive keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with the given key policy. Intermediate maps
    /// created below it inherit the policy.
    pub fn with_policy(policy: KeyPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(original key, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.node))
    }

    /// Iterates original keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Iterates nodes in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.iter().map(|entry| &entry.node)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&self.policy.normalize(key))
    }

    /// Returns the original spelling of a stored key.
    pub fn original_key(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].key.as_str())
    }

    /// Looks up one key without path traversal.
    pub fn get_exact_node(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|i| &self.entries[i].node)
    }

    pub fn get_exact_node_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.position(key).map(|i| &mut self.entries[i].node)
    }

    /// Stores one key without path traversal, replacing any previous value.
    ///
    /// A null `node` removes the key. The stored original spelling becomes
    /// `key`.
    pub fn set_exact_node(&mut self, key: &str, node: Node) -> Option<Node> {
        if node.is_null() {
            return self.remove_exact_node(key);
        }
        let normalized = self.policy.normalize(key);
        match self.index.get(&normalized) {
            Some(&i) => {
                let mut node = node;
                adopt_policy(&mut node, self.policy);
                attach(&mut node, &self.location, key);
                let entry = &mut self.entries[i];
                entry.key = key.to_string();
                let mut old = std::mem::replace(&mut entry.node, node);
                detach(&mut old);
                Some(old)
            }
            None => {
                self.push_entry(key, normalized, node);
                None
            }
        }
    }

    /// Stores one key, failing if its normalized form is already present.
    ///
    /// Inserting a null node is a no-op.
    pub fn insert_exact_node(&mut self, key: &str, node: Node) -> Result<(), NodeError> {
        if node.is_null() {
            return Ok(());
        }
        let normalized = self.policy.normalize(key);
        if let Some(&i) = self.index.get(&normalized) {
            return Err(NodeError::DuplicateKey {
                path: describe_location(Some(&self.location)),
                key: key.to_string(),
                existing: self.entries[i].key.clone(),
            });
        }
        self.push_entry(key, normalized, node);
        Ok(())
    }

    /// Removes one key without path traversal.
    pub fn remove_exact_node(&mut self, key: &str) -> Option<Node> {
        let normalized = self.policy.normalize(key);
        let i = self.index.remove(&normalized)?;
        let mut entry = self.entries.remove(i);
        self.reindex_from(i);
        detach(&mut entry.node);
        Some(entry.node)
    }

    /// Moves every entry of `other` into this map, failing on the first key
    /// that is already present.
    pub fn merge_disjoint(&mut self, other: MapNode) -> Result<(), NodeError> {
        for entry in other.entries {
            self.insert_exact_node(&entry.key, entry.node)?;
        }
        Ok(())
    }

    /// Rebuilds the path of `child` relative to this map using only the
    /// child's parent link.
    ///
    /// # Errors
    /// [`NodeError::NotASubNode`] if `child` is detached or lives elsewhere.
    pub fn path_of_sub_node(&self, child: &Node) -> Result<Path, NodeError> {
        let not_a_sub_node = || NodeError::NotASubNode {
            container: describe_location(Some(&self.location)),
        };
        let link = child.parent().ok_or_else(not_a_sub_node)?;
        match link.path().strip_prefix(&self.location) {
            Some(relative) if !relative.is_empty() => Ok(relative),
            _ => Err(not_a_sub_node()),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&self.policy.normalize(key)).copied()
    }

    fn push_entry(&mut self, key: &str, normalized: String, mut node: Node) -> usize {
        adopt_policy(&mut node, self.policy);
        attach(&mut node, &self.location, key);
        let i = self.entries.len();
        self.entries.push(MapEntry {
            key: key.to_string(),
            node,
        });
        self.index.insert(normalized, i);
        i
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, entry) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(self.policy.normalize(&entry.key), i);
        }
    }
}

impl Container for MapNode {
    fn location(&self) -> &Path {
        &self.location
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get_exact(&self, segment: &str) -> Result<Option<&Node>, NodeError> {
        Ok(self.get_exact_node(segment))
    }

    fn get_exact_mut(&mut self, segment: &str) -> Result<Option<&mut Node>, NodeError> {
        Ok(self.get_exact_node_mut(segment))
    }

    fn set_exact(&mut self, segment: &str, node: Node) -> Result<Option<Node>, NodeError> {
        Ok(self.set_exact_node(segment, node))
    }

    fn insert_exact(&mut self, segment: &str, node: Node) -> Result<(), NodeError> {
        self.insert_exact_node(segment, node)
    }

    fn remove_exact(&mut self, segment: &str) -> Result<Option<Node>, NodeError> {
        Ok(self.remove_exact_node(segment))
    }

    fn get_or_create_exact(&mut self, segment: &str) -> Result<&mut Node, NodeError> {
        let normalized = self.policy.normalize(segment);
        let i = match self.index.get(&normalized) {
            Some(&i) => i,
            None => {
                let child = Node::map(MapNode::with_policy(self.policy));
                self.push_entry(segment, normalized, child)
            }
        };
        Ok(&mut self.entries[i].node)
    }

    fn clean_up_empty_nodes(&mut self) {
        for entry in &mut self.entries {
            if let Some(container) = entry.node.as_container_mut() {
                container.clean_up_empty_nodes();
            }
        }
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.node.is_empty_container());
        if self.entries.len() != before {
            self.index.clear();
            self.reindex_from(0);
        }
    }

    fn relocate(&mut self, location: Path) {
        self.location = location;
        let location = &self.location;
        for entry in &mut self.entries {
            attach(&mut entry.node, location, &entry.key);
        }
    }
}

impl PartialEq for MapNode {
    /// Maps are equal when they hold equal nodes under the same normalized
    /// keys; entry order and location are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.policy == other.policy
            && self.len() == other.len()
            && self.entries.iter().all(|entry| {
                other
                    .get_exact_node(&entry.key)
                    .is_some_and(|node| node == &entry.node)
            })
    }
}

impl FromIterator<(String, Node)> for MapNode {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        let mut map = MapNode::new();
        for (key, node) in iter {
            map.set_exact_node(&key, node);
        }
        map
    }
}

impl IntoIterator for MapNode {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    /// Yields detached `(original key, node)` pairs in insertion order.
    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(|mut entry| {
                detach(&mut entry.node);
                (entry.key, entry.node)
            })
            .collect::<Vec<_>>()
            .into_iter()
    }
}
