// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observer resource: the parent-side record of one forked worker.
//! Tracks its PID, its end of the control channel, its lifecycle state,
//! and the lazily-armed idle-timeout timer.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use nix::unistd::Pid;
use sid_core::{SidError, SidResult};
use sid_resource::{Capabilities, IoInterest, NodeId, ResourceHooks, ResourceType, Tree};

use crate::control::ControlChannel;
use crate::state::{transition, WorkerEvent, WorkerState};

/// Idle timeout before a worker is reaped: `SID_IDLE_TIMEOUT_MS`
/// overrides the 5 second default.
pub fn idle_timeout() -> Duration {
    std::env::var("SID_IDLE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

pub struct ObserverData {
    pub pid: Pid,
    pub control: ControlChannel,
    pub state: WorkerState,
    /// Created on the first `Idle` transition, then reused: re-arming a
    /// fresh timer on every idle period would mean constantly tearing
    /// down and recreating a tokio timer task for a worker that mostly
    /// just sits idle.
    idle_timer: Option<sid_resource::EventSourceId>,
}

/// One-shot construction payload for [`ObserverHooks::init`]. Wrapped in
/// a `RefCell` because `init` only gets a shared `&dyn Any` but needs to
/// move the non-`Clone` `ControlChannel` out of it.
pub struct ObserverKickstart(pub RefCell<Option<(Pid, ControlChannel)>>);

impl ObserverKickstart {
    pub fn new(pid: Pid, control: ControlChannel) -> Self {
        Self(RefCell::new(Some((pid, control))))
    }
}

struct ObserverHooks;

impl ResourceHooks for ObserverHooks {
    fn init(&self, kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>> {
        let kickstart = kickstart
            .downcast_ref::<ObserverKickstart>()
            .ok_or_else(|| SidError::Fatal("observer init called with the wrong kickstart type".into()))?;
        let (pid, control) = kickstart
            .0
            .borrow_mut()
            .take()
            .ok_or_else(|| SidError::Fatal("observer kickstart already consumed".into()))?;
        Ok(Box::new(ObserverData { pid, control, state: WorkerState::Idle, idle_timer: None }))
    }
}

pub fn observer_type() -> Arc<ResourceType> {
    ResourceType::new("observer", Arc::new(ObserverHooks), Capabilities::default())
}

/// Reads the current lifecycle state of the observer at `node`.
pub fn observer_state(tree: &Tree, node: NodeId) -> SidResult<WorkerState> {
    Ok(tree.get_data::<ObserverData>(node)?.state)
}

/// Registers the two watchers every observer needs for its whole life:
/// the control-channel readability source (state signals) and the
/// child-exit source (abnormal or normal worker death).
pub fn register_observer_watchers(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    let (fd, pid) = {
        let data = tree.get_data::<ObserverData>(node)?;
        (data.control.as_raw_fd(), data.pid)
    };
    arm_control_watcher(tree, node, fd)?;
    tree.create_child_event_source(
        node,
        pid,
        Box::new(|tree, node| {
            tracing::debug!(?node, "worker process exited");
            on_event(tree, node, WorkerEvent::ChildExit)
        }),
    )?;
    Ok(())
}

fn arm_control_watcher(tree: &mut Tree, node: NodeId, fd: std::os::fd::RawFd) -> SidResult<()> {
    tree.create_io_event_source(
        node,
        fd,
        IoInterest::READABLE,
        Box::new(|tree, node| {
            let byte = {
                let data = tree.get_data::<ObserverData>(node)?;
                data.control.recv_signal()?
            };
            match byte {
                Some(crate::control::RUNNING_BYTE) => on_event(tree, node, WorkerEvent::ReportRunning)?,
                Some(crate::control::IDLE_BYTE) => on_event(tree, node, WorkerEvent::ReportIdle)?,
                Some(other) => {
                    tracing::warn!(other, "unexpected control-channel byte from worker");
                }
                None => on_event(tree, node, WorkerEvent::ChildExit)?,
            }
            // Re-arm for the next signal unless the worker is gone.
            if tree.contains(node) && observer_state(tree, node)? != WorkerState::Fini {
                let fd = tree.get_data::<ObserverData>(node)?.control.as_raw_fd();
                arm_control_watcher(tree, node, fd)?;
            }
            Ok(())
        }),
    )?;
    Ok(())
}

/// Applies a lifecycle event, updating the state and arming/cancelling
/// the idle timer as appropriate. `Fini` tears the observer node down
/// entirely, shrinking the pool by one.
pub fn on_event(tree: &mut Tree, node: NodeId, event: WorkerEvent) -> SidResult<()> {
    let current = observer_state(tree, node)?;
    let Some(next) = transition(current, event) else {
        return Err(SidError::Protocol(format!(
            "invalid worker transition {:?} -> (event {:?})",
            current, event
        )));
    };

    match next {
        WorkerState::Idle => {
            cancel_idle_timer(tree, node)?;
            arm_idle_timer(tree, node)?;
            tree.get_data_mut::<ObserverData>(node)?.state = next;
        }
        WorkerState::Init | WorkerState::Running => {
            cancel_idle_timer(tree, node)?;
            tree.get_data_mut::<ObserverData>(node)?.state = next;
        }
        WorkerState::Fini => {
            let pid = tree.get_data::<ObserverData>(node)?.pid;
            if event != WorkerEvent::ChildExit {
                let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM);
            }
            tree.destroy(node)?;
        }
    }
    Ok(())
}

fn arm_idle_timer(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    if tree.get_data::<ObserverData>(node)?.idle_timer.is_some() {
        return Ok(());
    }
    let id = tree.create_timer_event_source(
        node,
        idle_timeout(),
        Box::new(|tree, node| {
            tree.get_data_mut::<ObserverData>(node)?.idle_timer = None;
            if observer_state(tree, node)? == WorkerState::Idle {
                on_event(tree, node, WorkerEvent::IdleTimeout)
            } else {
                Ok(())
            }
        }),
    )?;
    tree.get_data_mut::<ObserverData>(node)?.idle_timer = Some(id);
    Ok(())
}

fn cancel_idle_timer(tree: &mut Tree, node: NodeId) -> SidResult<()> {
    if let Some(id) = tree.get_data_mut::<ObserverData>(node)?.idle_timer.take() {
        tree.destroy_event_source(id)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
