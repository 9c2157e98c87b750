//! Ordered container nodes.

use super::{
    Container, KeyPolicy, Node, NodeError, adopt_policy, attach, describe_location, detach,
};
use crate::path::Path;

/// An ordered, 0-indexed list of nodes.
///
/// Elements may be of any kind, including nested containers and nulls. Path
/// segments addressing a list are decimal indices; setting the index equal to
/// the length appends.
///
/// A list has no keys of its own. Maps it creates while setting a path use
/// its key policy, which it takes from the container it is stored in.
#[derive(Debug, Clone, Default)]
pub struct ListNode {
    policy: KeyPolicy,
    location: Path,
    items: Vec<Node>,
}

impl ListNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: KeyPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    pub(crate) fn adopt_policy(&mut self, policy: KeyPolicy) {
        self.policy = policy;
        for item in &mut self.items {
            adopt_policy(item, policy);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.items.iter()
    }

    /// Returns the element at `index`.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    /// Appends an element and returns its index.
    pub fn push(&mut self, mut node: Node) -> usize {
        let index = self.items.len();
        adopt_policy(&mut node, self.policy);
        attach(&mut node, &self.location, &index.to_string());
        self.items.push(node);
        index
    }

    /// Replaces the element at `index`, or appends when `index == len`.
    pub fn set_index(&mut self, index: usize, mut node: Node) -> Result<Option<Node>, NodeError> {
        match index.cmp(&self.items.len()) {
            std::cmp::Ordering::Less => {
                adopt_policy(&mut node, self.policy);
                attach(&mut node, &self.location, &index.to_string());
                let mut old = std::mem::replace(&mut self.items[index], node);
                detach(&mut old);
                Ok(Some(old))
            }
            std::cmp::Ordering::Equal => {
                self.push(node);
                Ok(None)
            }
            std::cmp::Ordering::Greater => Err(self.out_of_bounds(index)),
        }
    }

    /// Removes the element at `index`, shifting later elements down.
    pub fn remove_index(&mut self, index: usize) -> Option<Node> {
        if index >= self.items.len() {
            return None;
        }
        let mut old = self.items.remove(index);
        detach(&mut old);
        self.restamp_from(index);
        Some(old)
    }

    fn parse_index(&self, segment: &str) -> Result<usize, NodeError> {
        segment.trim().parse().map_err(|_| NodeError::InvalidIndex {
            path: describe_location(Some(&self.location)),
            segment: segment.to_string(),
        })
    }

    fn out_of_bounds(&self, index: usize) -> NodeError {
        NodeError::IndexOutOfBounds {
            path: describe_location(Some(&self.location)),
            index,
            len: self.items.len(),
        }
    }

    fn restamp_from(&mut self, start: usize) {
        let location = &self.location;
        for (i, item) in self.items.iter_mut().enumerate().skip(start) {
            attach(item, location, &i.to_string());
        }
    }
}

impl Container for ListNode {
    fn location(&self) -> &Path {
        &self.location
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get_exact(&self, segment: &str) -> Result<Option<&Node>, NodeError> {
        let index = self.parse_index(segment)?;
        Ok(self.items.get(index))
    }

    fn get_exact_mut(&mut self, segment: &str) -> Result<Option<&mut Node>, NodeError> {
        let index = self.parse_index(segment)?;
        Ok(self.items.get_mut(index))
    }

    fn set_exact(&mut self, segment: &str, node: Node) -> Result<Option<Node>, NodeError> {
        let index = self.parse_index(segment)?;
        self.set_index(index, node)
    }

    fn insert_exact(&mut self, segment: &str, node: Node) -> Result<(), NodeError> {
        let index = self.parse_index(segment)?;
        if index < self.items.len() {
            return Err(NodeError::DuplicateKey {
                path: describe_location(Some(&self.location)),
                key: segment.to_string(),
                existing: index.to_string(),
            });
        }
        self.set_index(index, node).map(|_| ())
    }

    fn remove_exact(&mut self, segment: &str) -> Result<Option<Node>, NodeError> {
        let index = self.parse_index(segment)?;
        Ok(self.remove_index(index))
    }

    fn get_or_create_exact(&mut self, segment: &str) -> Result<&mut Node, NodeError> {
        let index = self.parse_index(segment)?;
        if index == self.items.len() {
            self.push(Node::map(super::MapNode::with_policy(self.policy)));
        } else if index > self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        Ok(&mut self.items[index])
    }

    fn clean_up_empty_nodes(&mut self) {
        for item in &mut self.items {
            if let Some(container) = item.as_container_mut() {
                container.clean_up_empty_nodes();
            }
        }
        let before = self.items.len();
        self.items.retain(|item| !item.is_empty_container());
        if self.items.len() != before {
            self.restamp_from(0);
        }
    }

    fn relocate(&mut self, location: Path) {
        self.location = location;
        self.restamp_from(0);
    }
}

impl PartialEq for ListNode {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl From<Vec<Node>> for ListNode {
    fn from(items: Vec<Node>) -> Self {
        items.into_iter().collect()
    }
}

impl FromIterator<Node> for ListNode {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        let mut list = ListNode::new();
        for node in iter {
            list.push(node);
        }
        list
    }
}

impl IntoIterator for ListNode {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    /// Yields detached elements in order.
    fn into_iter(self) -> Self::IntoIter {
        let mut items = self.items;
        for item in &mut items {
            detach(item);
        }
        items.into_iter()
    }
}
