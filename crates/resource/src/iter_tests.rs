use super::*;
use crate::tree::Tree;
use crate::types::{Capabilities, NodeFlags, NoopHooks, ResourceType};
use std::sync::Arc;

fn plain_type() -> Arc<ResourceType> {
    ResourceType::new("child", Arc::new(NoopHooks), Capabilities::default())
}

#[test]
fn iterates_children_forward_and_backward() {
    let mut tree = Tree::new();
    let root = tree.create(None, plain_type(), NodeFlags::NONE, "root", &()).unwrap();
    let a = tree.create(Some(root), plain_type(), NodeFlags::NONE, "a", &()).unwrap();
    let b = tree.create(Some(root), plain_type(), NodeFlags::NONE, "b", &()).unwrap();
    let c = tree.create(Some(root), plain_type(), NodeFlags::NONE, "c", &()).unwrap();

    let mut it = ResourceIter::create(&tree, root).unwrap();
    assert_eq!(it.next(&tree), Some(a));
    assert_eq!(it.next(&tree), Some(b));
    assert_eq!(it.current(), Some(b));
    assert_eq!(it.previous(&tree), Some(a));
    assert_eq!(it.next(&tree), Some(b));
    assert_eq!(it.next(&tree), Some(c));
    assert_eq!(it.next(&tree), None);

    it.reset();
    assert_eq!(it.current(), None);
    assert_eq!(it.next(&tree), Some(a));
}

#[test]
fn skips_entries_destroyed_during_iteration() {
    let mut tree = Tree::new();
    let root = tree.create(None, plain_type(), NodeFlags::NONE, "root", &()).unwrap();
    let a = tree.create(Some(root), plain_type(), NodeFlags::NONE, "a", &()).unwrap();
    let b = tree.create(Some(root), plain_type(), NodeFlags::NONE, "b", &()).unwrap();
    let c = tree.create(Some(root), plain_type(), NodeFlags::NONE, "c", &()).unwrap();

    let mut it = ResourceIter::create(&tree, root).unwrap();
    assert_eq!(it.next(&tree), Some(a));
    tree.destroy(b).unwrap();
    assert_eq!(it.next(&tree), Some(c));
    assert_eq!(it.next(&tree), None);
}
