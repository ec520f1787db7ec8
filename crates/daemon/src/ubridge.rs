// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `ubridge` resource: the daemon's event-loop-owning root. Binds
//! the abstract-namespace listening socket, accepts connections, and
//! hands each one to `sid_worker::dispatch_connection`.

use std::any::Any;
use std::cell::RefCell;
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd};
use std::sync::Arc;

use nix::sys::socket::{accept4, bind, listen, socket, AddressFamily, SockFlag, SockType, UnixAddr};
use sid_core::{SidError, SidResult};
use sid_resource::{Capabilities, IoInterest, NodeFlags, NodeId, ResourceHooks, ResourceType, Tree};
use sid_worker::{dispatch_connection, CommandExecutor};

struct UbridgeData {
    listener: OwnedFd,
    executor: Arc<dyn CommandExecutor>,
}

/// One-shot construction payload for [`UbridgeHooks::init`], following
/// the same consume-once convention as `sid_worker`'s observer/worker
/// kickstarts.
pub struct UbridgeKickstart(RefCell<Option<(OwnedFd, Arc<dyn CommandExecutor>)>>);

impl UbridgeKickstart {
    pub fn new(listener: OwnedFd, executor: Arc<dyn CommandExecutor>) -> Self {
        Self(RefCell::new(Some((listener, executor))))
    }
}

struct UbridgeHooks;

impl ResourceHooks for UbridgeHooks {
    fn init(&self, kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>> {
        let kickstart = kickstart
            .downcast_ref::<UbridgeKickstart>()
            .ok_or_else(|| SidError::Fatal("ubridge init called with the wrong kickstart type".into()))?;
        let (listener, executor) = kickstart
            .0
            .borrow_mut()
            .take()
            .ok_or_else(|| SidError::Fatal("ubridge kickstart already consumed".into()))?;
        Ok(Box::new(UbridgeData { listener, executor }))
    }
}

pub fn ubridge_type() -> Arc<ResourceType> {
    ResourceType::new("ubridge", Arc::new(UbridgeHooks), Capabilities { owns_event_loop: true, has_watchdog: false })
}

/// Binds an abstract-namespace `SOCK_STREAM` listening socket named
/// `name` (no leading NUL — [`UnixAddr::new_abstract`] adds the
/// abstract marker itself).
pub fn bind_listener(name: &str) -> SidResult<OwnedFd> {
    let fd = socket(AddressFamily::Unix, SockType::Stream, SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC, None)
        .map_err(SidError::from)?;
    let addr = UnixAddr::new_abstract(name.as_bytes()).map_err(SidError::from)?;
    bind(fd.as_raw_fd(), &addr).map_err(SidError::from)?;
    listen(&fd, 128).map_err(SidError::from)?;
    Ok(fd)
}

/// Creates the `ubridge` root node and arms its accept loop.
pub fn create_ubridge(tree: &mut Tree, listener: OwnedFd, executor: Arc<dyn CommandExecutor>) -> SidResult<NodeId> {
    let kickstart = UbridgeKickstart::new(listener, executor);
    let node = tree.create(None, ubridge_type(), NodeFlags::NONE, "ubridge", &kickstart)?;
    arm_accept_watcher(tree, node)?;
    Ok(node)
}

fn arm_accept_watcher(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    let fd = tree.get_data::<UbridgeData>(node)?.listener.as_raw_fd();
    tree.create_io_event_source(node, fd, IoInterest::READABLE, Box::new(on_listener_readable))?;
    Ok(())
}

/// Drains every connection immediately acceptable, handing each to the
/// worker pool, then re-arms for the next readability notification.
fn on_listener_readable(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    loop {
        let (listener_fd, executor) = {
            let data = tree.get_data::<UbridgeData>(node)?;
            (data.listener.as_raw_fd(), Arc::clone(&data.executor))
        };
        match accept4(listener_fd, SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC) {
            Ok(accepted) => {
                let raw = accepted.into_raw_fd();
                if let Err(e) = dispatch_connection(tree, node, Arc::clone(&executor), raw) {
                    tracing::warn!(error = %e, "failed to dispatch accepted connection");
                }
            }
            Err(nix::Error::EAGAIN) => break,
            Err(nix::Error::EINTR) => continue,
            Err(e) => {
                tracing::warn!(error = %SidError::from(e), "error accepting connection; ubridge listener still armed");
                break;
            }
        }
    }
    arm_accept_watcher(tree, node)
}

#[cfg(test)]
#[path = "ubridge_tests.rs"]
mod tests;
