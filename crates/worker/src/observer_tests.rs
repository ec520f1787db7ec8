use super::*;
use sid_resource::{NodeFlags, Tree};

fn make_observer(tree: &mut Tree) -> NodeId {
    let root = tree
        .create(None, sid_resource::ResourceType::new("ubridge", Arc::new(sid_resource::NoopHooks), Capabilities::default()), NodeFlags::NONE, "ubridge", &())
        .unwrap();
    let (observer_end, _worker_end) = ControlChannel::pair().unwrap();
    // A pid that (almost certainly) doesn't exist, so the Fini-path
    // SIGTERM is a harmless no-op in tests.
    let bogus_pid = Pid::from_raw(i32::MAX - 1);
    let kickstart = ObserverKickstart::new(bogus_pid, observer_end);
    tree.create(Some(root), observer_type(), NodeFlags::NONE, "obs-0", &kickstart).unwrap()
}

#[test]
fn starts_idle() {
    let mut tree = Tree::new();
    let obs = make_observer(&mut tree);
    assert_eq!(observer_state(&tree, obs).unwrap(), WorkerState::Idle);
}

#[test]
fn connection_then_running_then_idle_round_trips() {
    let mut tree = Tree::new();
    let obs = make_observer(&mut tree);
    on_event(&mut tree, obs, WorkerEvent::ConnectionAssigned).unwrap();
    assert_eq!(observer_state(&tree, obs).unwrap(), WorkerState::Init);
    on_event(&mut tree, obs, WorkerEvent::ReportRunning).unwrap();
    assert_eq!(observer_state(&tree, obs).unwrap(), WorkerState::Running);
    on_event(&mut tree, obs, WorkerEvent::ReportIdle).unwrap();
    assert_eq!(observer_state(&tree, obs).unwrap(), WorkerState::Idle);
}

#[test]
fn invalid_transition_is_rejected() {
    let mut tree = Tree::new();
    let obs = make_observer(&mut tree);
    assert!(on_event(&mut tree, obs, WorkerEvent::ReportRunning).is_err());
}

#[test]
fn idle_timeout_destroys_the_observer() {
    let mut tree = Tree::new();
    let obs = make_observer(&mut tree);
    on_event(&mut tree, obs, WorkerEvent::IdleTimeout).unwrap();
    assert!(!tree.contains(obs));
}

#[test]
fn child_exit_destroys_the_observer_from_any_state() {
    let mut tree = Tree::new();
    let obs = make_observer(&mut tree);
    on_event(&mut tree, obs, WorkerEvent::ConnectionAssigned).unwrap();
    on_event(&mut tree, obs, WorkerEvent::ChildExit).unwrap();
    assert!(!tree.contains(obs));
}
