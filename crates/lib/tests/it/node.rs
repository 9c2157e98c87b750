//! Tests for path addressing and the Container contract.

use cfgtree::{
    Container, MapNode, Node, Path,
    node::{KeyPolicy, ListNode, NodeError, Scalar},
    path,
};

#[test]
fn test_set_then_get_ignores_case_but_keeps_original_spelling() {
    let mut root = MapNode::new();
    root.set(&Path::from("Foo"), Node::from("x")).unwrap();

    assert_eq!(root.get(&Path::from("foo")).unwrap(), Some(&Node::from("x")));
    assert_eq!(root.keys().collect::<Vec<_>>(), ["Foo"]);
}

#[test]
fn test_set_creates_intermediate_maps() {
    let mut root = MapNode::new();
    root.set(&path!("server", "tls.enabled"), Node::from(true))
        .unwrap();

    let server = root.get(&Path::from("server")).unwrap().unwrap();
    assert!(server.as_map().is_some());
    let enabled = root
        .get(&Path::from("SERVER.TLS.ENABLED"))
        .unwrap()
        .unwrap();
    assert_eq!(enabled.value(), Some(&Scalar::Bool(true)));
    assert_eq!(enabled.path(), Some(Path::from("server.tls.enabled")));
}

#[test]
fn test_null_entry_is_a_tombstone() {
    let mut root = MapNode::new();
    root.set(&Path::from("a.b"), Node::from(1)).unwrap();
    root.set(&Path::from("a.c"), Node::from(2)).unwrap();
    root.set(&Path::from("a.b"), Node::null()).unwrap();

    assert_eq!(root.get(&Path::from("a.b")).unwrap(), None);
    let a = root.get(&Path::from("a")).unwrap().unwrap().as_map().unwrap();
    assert_eq!(a.keys().collect::<Vec<_>>(), ["c"]);
}

#[test]
fn test_traversal_through_scalar_is_invalid_path() {
    let mut root = MapNode::new();
    root.set(&Path::from("port"), Node::from(8080)).unwrap();

    let err = root.get(&Path::from("port.number")).unwrap_err();
    assert!(err.is_invalid_path());
    assert_eq!(
        err,
        NodeError::InvalidPath {
            path: "port".to_string(),
            kind: "scalar"
        }
    );

    assert!(
        root.set(&Path::from("port.number"), Node::from(1))
            .unwrap_err()
            .is_invalid_path()
    );
    assert!(
        root.remove(&Path::from("port.number"))
            .unwrap_err()
            .is_invalid_path()
    );
}

#[test]
fn test_missing_intermediate_reports_absence() {
    let root = MapNode::new();
    assert_eq!(root.get(&Path::from("a.b.c")).unwrap(), None);
}

#[test]
fn test_remove_returns_prior_value() {
    let mut root = MapNode::new();
    root.set(&Path::from("db.host"), Node::from("pg")).unwrap();
    let removed = root.remove(&Path::from("DB.Host")).unwrap();
    assert_eq!(removed, Some(Node::from("pg")));
    assert!(removed.unwrap().parent().is_none());
    assert_eq!(root.remove(&Path::from("db.host")).unwrap(), None);
}

#[test]
fn test_clean_up_removes_emptied_nested_map_and_keeps_siblings() {
    let mut root = MapNode::new();
    root.set(&Path::from("outer.inner.leaf"), Node::from(1))
        .unwrap();
    root.set(&Path::from("sibling"), Node::from("keep")).unwrap();
    root.remove(&Path::from("outer.inner.leaf")).unwrap();

    root.clean_up_empty_nodes();

    assert!(!root.contains_key("outer"));
    assert_eq!(
        root.get(&Path::from("sibling")).unwrap(),
        Some(&Node::from("keep"))
    );
}

#[test]
fn test_lists_inside_maps() {
    let mut root = MapNode::new();
    root.set(
        &Path::from("hosts"),
        Node::list(ListNode::from(vec![Node::from("a"), Node::from("b")])),
    )
    .unwrap();
    root.set(&Path::from("hosts.2"), Node::from("c")).unwrap();

    let third = root.get(&Path::from("hosts.2")).unwrap().unwrap();
    assert_eq!(third.as_text().unwrap(), "c");
    assert!(
        root.get(&Path::from("hosts.x"))
            .unwrap_err()
            .is_index_error()
    );
}

#[test]
fn test_strict_insert_fails_on_normalized_duplicate() {
    let mut root = MapNode::new();
    root.insert(&Path::from("a.Key"), Node::from(1)).unwrap();
    let err = root.insert(&Path::from("A.key"), Node::from(2)).unwrap_err();
    assert!(err.is_duplicate_key());
}

#[test]
fn test_exact_key_policy_is_inherited_by_intermediates() {
    let mut root = MapNode::with_policy(KeyPolicy::Exact);
    root.set(&Path::from("Outer.x"), Node::from(1)).unwrap();
    root.set(&Path::from("outer.x"), Node::from(2)).unwrap();
    assert_eq!(root.len(), 2);
    assert_eq!(root.get(&Path::from("OUTER.x")).unwrap(), None);
}

#[test]
fn test_path_of_sub_node_uses_parent_links() {
    let mut root = MapNode::new();
    root.set(&Path::from("a.b.c"), Node::from(true)).unwrap();
    let leaf = root.get(&Path::from("a.b.c")).unwrap().unwrap();
    assert_eq!(
        root.path_of_sub_node(leaf).unwrap(),
        Path::from("a.b.c")
    );

    let a = root
        .get(&Path::from("a"))
        .unwrap()
        .unwrap()
        .as_map()
        .unwrap();
    assert_eq!(a.path_of_sub_node(leaf).unwrap(), Path::from("b.c"));
    assert!(root.path_of_sub_node(&Node::from(true)).is_err());
}

#[test]
fn test_moved_subtree_is_restamped() {
    let mut source = MapNode::new();
    source.set(&Path::from("x.y"), Node::from(1)).unwrap();
    let subtree = source.remove(&Path::from("x")).unwrap().unwrap();

    let mut target = MapNode::new();
    target.set(&Path::from("moved.here"), subtree).unwrap();
    let leaf = target.get(&Path::from("moved.here.y")).unwrap().unwrap();
    assert_eq!(leaf.path(), Some(Path::from("moved.here.y")));
}

#[test]
fn test_error_node_continues_tree_build() {
    let mut root = MapNode::new();
    root.set(&Path::from("good"), Node::from(1)).unwrap();
    root.set(&Path::from("bad"), Node::error("not a number"))
        .unwrap();
    root.set(&Path::from("also_good"), Node::from(2)).unwrap();

    assert_eq!(root.len(), 3);
    let bad = root.get(&Path::from("bad")).unwrap().unwrap();
    assert_eq!(bad.error_message(), Some("not a number"));
    assert!(bad.as_text().is_err());
}
