//! `serde` support for node trees.
//!
//! Serializing renders the plain data form of a tree: scalars become their
//! natural serde types (symbols, UUIDs, dates and type references become
//! strings), maps keep their original key spelling and order, and lists stay
//! lists. Comments and inherited flags have no place in that form and are not
//! written. Error nodes cannot be rendered and fail serialization.
//!
//! Deserializing builds a detached tree from any self-describing format. Null
//! map values are tombstones and are dropped; keys that collide after
//! normalization fail. The plain `Deserialize` impls compare keys
//! case-insensitively; [`NodeSeed`] and [`MapNode::deserialize_with`] take
//! the key policy explicitly.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};

use super::{KeyPolicy, ListNode, MapNode, Node, NodeKind, Scalar};

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(n) => serializer.serialize_i64(*n),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Text(s) | Scalar::Symbol(s) | Scalar::TypeRef(s) => serializer.serialize_str(s),
            Scalar::Uuid(_) | Scalar::Date(_) => serializer.serialize_str(&self.as_text()),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.kind() {
            NodeKind::Scalar(scalar) => scalar.serialize(serializer),
            NodeKind::List(list) => list.serialize(serializer),
            NodeKind::Map(map) => map.serialize(serializer),
            NodeKind::Null => serializer.serialize_unit(),
            NodeKind::Error(message) => Err(serde::ser::Error::custom(format!(
                "cannot render error node at '{}': {message}",
                super::describe_location(self.path().as_ref())
            ))),
        }
    }
}

impl Serialize for ListNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for MapNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, node) in self.iter() {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

/// Deserializes a [`Node`] whose maps use the given key policy.
///
/// ```
/// use cfgtree::node::{KeyPolicy, NodeSeed};
/// use serde::de::DeserializeSeed;
///
/// let mut json = serde_json::Deserializer::from_str(r#"{"Port": 1, "port": 2}"#);
/// let node = NodeSeed::new(KeyPolicy::Exact).deserialize(&mut json)?;
/// assert_eq!(node.as_map().map(|map| map.len()), Some(2));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeSeed {
    policy: KeyPolicy,
}

impl NodeSeed {
    pub fn new(policy: KeyPolicy) -> Self {
        Self { policy }
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed {
    type Value = Node;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        deserializer.deserialize_any(NodeVisitor {
            policy: self.policy,
        })
    }
}

struct NodeVisitor {
    policy: KeyPolicy,
}

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a configuration value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::scalar(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::scalar(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        // Values above i64::MAX keep their exact digits as text
        Ok(match i64::try_from(v) {
            Ok(n) => Node::scalar(n),
            Err(_) => Node::scalar(v.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::scalar(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::scalar(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::scalar(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        NodeSeed::new(self.policy).deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let seed = NodeSeed::new(self.policy);
        let mut list = ListNode::with_policy(self.policy);
        while let Some(item) = seq.next_element_seed(seed)? {
            list.push(item);
        }
        Ok(Node::list(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
        let seed = NodeSeed::new(self.policy);
        let mut map = MapNode::with_policy(self.policy);
        while let Some(key) = access.next_key::<String>()? {
            let value = access.next_value_seed(seed)?;
            map.insert_exact_node(&key, value)
                .map_err(de::Error::custom)?;
        }
        Ok(Node::map(map))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NodeSeed::default().deserialize(deserializer)
    }
}

impl MapNode {
    /// Deserializes a map whose keys, and those of every nested map, follow
    /// `policy`.
    pub fn deserialize_with<'de, D: Deserializer<'de>>(
        deserializer: D,
        policy: KeyPolicy,
    ) -> Result<Self, D::Error> {
        let node = NodeSeed::new(policy).deserialize(deserializer)?;
        let kind = node.kind_name();
        node.into_map()
            .ok_or_else(|| de::Error::custom(format!("expected a map, found a {kind} node")))
    }
}

impl<'de> Deserialize<'de> for MapNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        MapNode::deserialize_with(deserializer, KeyPolicy::default())
    }
}

impl<'de> Deserialize<'de> for ListNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Node::deserialize(deserializer)?.into_kind() {
            NodeKind::List(list) => Ok(list),
            other => Err(de::Error::custom(format!(
                "expected a list, found a {} node",
                other.name()
            ))),
        }
    }
}
