// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker process's own event loop. A worker is a resource root with
//! no parent (the forked child tore down everything it inherited): it
//! waits on its end of the control channel for a handed-off connection,
//! reads one complete framed request, runs it through the caller's
//! [`CommandExecutor`], writes the response, and goes back to waiting.

use std::any::Any;
use std::cell::RefCell;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::Arc;

use sid_buffer::{Backend, Buffer, BufferInit, BufferSpec, Mode, Shape};
use sid_core::{SidError, SidResult};
use sid_resource::{Capabilities, IoInterest, NodeFlags, NodeId, ResourceHooks, ResourceType, Tree};

use crate::control::{ControlChannel, RUNNING_BYTE};
use crate::executor::CommandExecutor;

/// Initial allocation and growth step for both the inbound request
/// buffer and the scratch outbound response buffer. Requests and
/// replies on this socket are small (a handful of `KEY=VALUE` pairs or
/// a few bytes of version payload), so this comfortably covers the
/// common case without ever growing.
const REQUEST_BUFFER_INIT: BufferInit = BufferInit::new(4096, 4096, 0);

struct WorkerData {
    control: ControlChannel,
    executor: Arc<dyn CommandExecutor>,
    request: Buffer,
    /// The connection currently handed off by the observer, if any.
    /// Held here (rather than dropped immediately) so the fd stays open
    /// across the several event-loop ticks a request may take to arrive.
    connection: Option<OwnedFd>,
}

/// One-shot construction payload for [`WorkerHooks::init`], consumed the
/// same way [`crate::observer::ObserverKickstart`] is.
pub struct WorkerKickstart(RefCell<Option<(ControlChannel, Arc<dyn CommandExecutor>)>>);

impl WorkerKickstart {
    pub fn new(control: ControlChannel, executor: Arc<dyn CommandExecutor>) -> Self {
        Self(RefCell::new(Some((control, executor))))
    }
}

struct WorkerHooks;

impl ResourceHooks for WorkerHooks {
    fn init(&self, kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>> {
        let kickstart = kickstart
            .downcast_ref::<WorkerKickstart>()
            .ok_or_else(|| SidError::Fatal("worker init called with the wrong kickstart type".into()))?;
        let (control, executor) = kickstart
            .0
            .borrow_mut()
            .take()
            .ok_or_else(|| SidError::Fatal("worker kickstart already consumed".into()))?;
        let request = Buffer::create(
            BufferSpec::new(Backend::Heap, Shape::Linear, Mode::SizePrefix),
            REQUEST_BUFFER_INIT,
        )?;
        Ok(Box::new(WorkerData { control, executor, request, connection: None }))
    }
}

fn worker_root_type() -> Arc<ResourceType> {
    ResourceType::new("worker", Arc::new(WorkerHooks), Capabilities { owns_event_loop: true, has_watchdog: false })
}

/// Entry point for the forked child: builds a fresh resource tree rooted
/// on a single `worker` node and drives it until the control channel
/// closes or a shutdown signal arrives. Never returns a value — the
/// caller (`spawn_worker`'s child branch) exits the process right after.
pub fn run_worker(control: ControlChannel, executor: Arc<dyn CommandExecutor>) {
    if let Err(e) = run_worker_inner(control, executor) {
        tracing::error!(error = %e, "worker process terminated abnormally");
    }
}

fn run_worker_inner(control: ControlChannel, executor: Arc<dyn CommandExecutor>) -> SidResult<()> {
    let mut tree = Tree::new();
    let kickstart = WorkerKickstart::new(control, executor);
    let root = tree.create(None, worker_root_type(), NodeFlags::NONE, "worker", &kickstart)?;

    install_signal_handlers(&mut tree, root)?;
    arm_control_wait(&mut tree, root)?;

    tree.run_event_loop(root)
}

fn install_signal_handlers(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    for signal in [nix::sys::signal::Signal::SIGTERM, nix::sys::signal::Signal::SIGINT] {
        tree.create_signal_event_source(
            node,
            signal as i32,
            Box::new(|tree, node| {
                tracing::info!("worker received shutdown signal");
                tree.exit_event_loop(node)
            }),
        )?;
    }
    Ok(())
}

/// Arms the control-channel read side. Re-armed every time the worker
/// returns to waiting: once after the signal-handoff path hands off a
/// connection, and once after a connection finishes (successfully or
/// not) and IDLE has been reported.
fn arm_control_wait(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    let fd = tree.get_data::<WorkerData>(node)?.control.as_raw_fd();
    tree.create_io_event_source(
        node,
        fd,
        IoInterest::READABLE,
        Box::new(|tree, node| on_control_readable(tree, node)),
    )?;
    Ok(())
}

fn on_control_readable(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    let received = tree.get_data::<WorkerData>(node)?.control.recv_fd();
    match received {
        Ok(Some(owned)) => {
            let raw = owned.as_raw_fd();
            tree.get_data_mut::<WorkerData>(node)?.connection = Some(owned);
            if let Err(e) = tree.get_data::<WorkerData>(node)?.control.send_signal(RUNNING_BYTE) {
                tracing::warn!(error = %e, "failed to ack connection handoff to observer");
            }
            arm_connection_read(tree, node, raw)
        }
        Ok(None) => {
            tracing::debug!("control channel closed by observer; worker exiting");
            tree.exit_event_loop(node)
        }
        Err(e) => {
            tracing::warn!(error = %e, "control channel error; worker exiting");
            tree.exit_event_loop(node)
        }
    }
}

fn arm_connection_read(tree: &mut Tree, node: NodeId, fd: RawFd) -> SidResult<()> {
    tree.create_io_event_source(
        node,
        fd,
        IoInterest::READABLE,
        Box::new(move |tree, node| on_connection_readable(tree, node, fd)),
    )?;
    Ok(())
}

/// Reads until either a complete frame has arrived, the peer closes the
/// connection, or the fd would block (EAGAIN/EINTR are retried
/// transparently at this loop boundary, per spec, by simply re-arming).
fn on_connection_readable(tree: &mut Tree, node: NodeId, fd: RawFd) -> SidResult<()> {
    loop {
        let outcome = tree.get_data_mut::<WorkerData>(node)?.request.read(fd);
        match outcome {
            Ok(0) => {
                tracing::debug!("connection closed before a complete request arrived");
                return finish_connection(tree, node);
            }
            Ok(_) => {
                if tree.get_data::<WorkerData>(node)?.request.is_complete() {
                    return handle_request(tree, node, fd);
                }
                // Keep draining while bytes are immediately available.
            }
            Err(e) if e.is_retryable() => return arm_connection_read(tree, node, fd),
            Err(e) => {
                tracing::warn!(error = %e, "error reading request frame");
                return finish_connection(tree, node);
            }
        }
    }
}

/// Runs the request through the executor, which decodes it, dispatches
/// it, and writes the response frame to `fd` itself — see the command
/// pipeline's dispatch, which is the sole implementor in the daemon
/// binary.
fn handle_request(tree: &mut Tree, node: NodeId, fd: RawFd) -> SidResult<()> {
    let (request, executor) = {
        let data = tree.get_data::<WorkerData>(node)?;
        (data.request.data().to_vec(), Arc::clone(&data.executor))
    };

    if let Err(e) = executor.execute(tree, node, fd, &request) {
        tracing::warn!(error = %e, "command execution failed");
    }

    finish_connection(tree, node)
}

/// Tears down the just-served connection, resets the reusable request
/// buffer, reports IDLE, and goes back to waiting on the control
/// channel. If the IDLE report itself fails the control channel is
/// gone, so there is nothing left to serve — the worker exits.
fn finish_connection(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    {
        let data = tree.get_data_mut::<WorkerData>(node)?;
        data.connection = None;
        data.request.reset(0);
    }
    match tree.get_data::<WorkerData>(node)?.control.send_signal(crate::control::IDLE_BYTE) {
        Ok(()) => arm_control_wait(tree, node),
        Err(e) => {
            tracing::warn!(error = %e, "control channel lost reporting idle; worker exiting");
            tree.exit_event_loop(node)
        }
    }
}

#[cfg(test)]
#[path = "worker_loop_tests.rs"]
mod tests;
