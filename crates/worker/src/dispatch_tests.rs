use super::*;
use std::os::fd::AsRawFd;

use nix::unistd::Pid;
use sid_resource::{Capabilities, NodeFlags, NoopHooks, ResourceType};

use crate::observer::{observer_type, ObserverKickstart};

fn make_ubridge(tree: &mut Tree) -> NodeId {
    tree.create(None, ResourceType::new("ubridge", std::sync::Arc::new(NoopHooks), Capabilities::default()), NodeFlags::NONE, "ubridge", &())
        .unwrap()
}

fn add_observer(tree: &mut Tree, ubridge: NodeId, id: &str) -> (NodeId, crate::control::ControlChannel) {
    let (observer_end, worker_end) = crate::control::ControlChannel::pair().unwrap();
    let bogus_pid = Pid::from_raw(i32::MAX - 1);
    let kickstart = ObserverKickstart::new(bogus_pid, observer_end);
    let node = tree.create(Some(ubridge), observer_type(), NodeFlags::NONE, id, &kickstart).unwrap();
    (node, worker_end)
}

fn noop_executor() -> Arc<dyn CommandExecutor> {
    Arc::new(|_tree: &mut Tree, _worker: NodeId, _fd: std::os::fd::RawFd, _request: &[u8]| -> SidResult<()> { Ok(()) })
}

#[test]
fn selects_first_idle_observer_in_insertion_order() {
    let mut tree = Tree::new();
    let ubridge = make_ubridge(&mut tree);
    let (obs0, _w0) = add_observer(&mut tree, ubridge, "obs-0");
    let (obs1, _w1) = add_observer(&mut tree, ubridge, "obs-1");
    on_event(&mut tree, obs0, WorkerEvent::ConnectionAssigned).unwrap();

    assert_eq!(select_idle_observer(&tree, ubridge).unwrap(), Some(obs1));
}

#[test]
fn returns_none_when_no_observer_is_idle() {
    let mut tree = Tree::new();
    let ubridge = make_ubridge(&mut tree);
    let (obs0, _w0) = add_observer(&mut tree, ubridge, "obs-0");
    on_event(&mut tree, obs0, WorkerEvent::ConnectionAssigned).unwrap();

    assert_eq!(select_idle_observer(&tree, ubridge).unwrap(), None);
}

#[test]
fn hands_a_connection_fd_to_the_chosen_observer() {
    let mut tree = Tree::new();
    let ubridge = make_ubridge(&mut tree);
    let (obs0, worker_end) = add_observer(&mut tree, ubridge, "obs-0");

    let tmp = tempfile::tempfile().unwrap();
    let fd = nix::unistd::dup(tmp.as_raw_fd()).unwrap();

    send_fd_to_observer(&tree, obs0, fd).unwrap();
    let received = worker_end.recv_fd().unwrap().expect("worker should receive the handed-off fd");
    assert_ne!(received.as_raw_fd(), fd);

    let _ = nix::unistd::close(fd);
}

#[test]
fn dispatch_connection_reuses_an_idle_observer_without_spawning() {
    let mut tree = Tree::new();
    let ubridge = make_ubridge(&mut tree);
    let (obs0, worker_end) = add_observer(&mut tree, ubridge, "obs-0");

    let tmp = tempfile::tempfile().unwrap();
    let fd = nix::unistd::dup(tmp.as_raw_fd()).unwrap();

    dispatch_connection(&mut tree, ubridge, noop_executor(), fd).unwrap();

    assert_eq!(crate::observer::observer_state(&tree, obs0).unwrap(), WorkerState::Init);
    assert!(worker_end.recv_fd().unwrap().is_some());
}
