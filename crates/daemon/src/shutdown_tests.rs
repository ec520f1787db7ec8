use super::*;

use sid_resource::{Capabilities, NodeFlags, NoopHooks, ResourceType};

fn make_root(tree: &mut Tree) -> NodeId {
    tree.create(
        None,
        ResourceType::new("ubridge", std::sync::Arc::new(NoopHooks), Capabilities { owns_event_loop: true, has_watchdog: false }),
        NodeFlags::NONE,
        "ubridge",
        &(),
    )
    .unwrap()
}

#[test]
fn installs_both_signal_handlers_without_error() {
    let mut tree = Tree::new();
    let ubridge = make_root(&mut tree);
    install_shutdown_handlers(&mut tree, ubridge).unwrap();
}

#[test]
fn signalling_an_empty_pool_is_a_no_op() {
    let mut tree = Tree::new();
    let ubridge = make_root(&mut tree);
    signal_all_workers(&tree, ubridge);
}

#[test]
fn ignores_non_observer_children_when_signalling() {
    let mut tree = Tree::new();
    let ubridge = make_root(&mut tree);
    tree.create(Some(ubridge), ResourceType::new("other", std::sync::Arc::new(NoopHooks), Capabilities::default()), NodeFlags::NONE, "other", &())
        .unwrap();
    signal_all_workers(&tree, ubridge);
}
