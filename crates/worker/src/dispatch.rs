// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handing an accepted connection to a worker: scan the observer pool
//! for the first idle one, spawning a fresh worker if none is found.

use std::os::fd::RawFd;
use std::sync::Arc;

use sid_core::{SidError, SidResult};
use sid_resource::{NodeId, Tree};

use crate::executor::CommandExecutor;
use crate::observer::{observer_state, on_event};
use crate::spawn::spawn_worker;
use crate::state::{WorkerEvent, WorkerState};

/// First-idle scan over `ubridge`'s observer children, in insertion
/// order. O(n) in the pool size; fine for the pool sizes this daemon
/// runs (tens, not thousands, of workers).
fn select_idle_observer(tree: &Tree, ubridge: NodeId) -> SidResult<Option<NodeId>> {
    for child in tree.children_snapshot(ubridge)? {
        if tree.is_type_of(child, "observer")? && observer_state(tree, child)? == WorkerState::Idle {
            return Ok(Some(child));
        }
    }
    Ok(None)
}

/// Hands `fd` (an accepted connection) to an idle worker, spawning a new
/// one if the pool has none idle. Closes `fd` in this process once the
/// worker has it: the parent has no further use for the descriptor.
pub fn dispatch_connection(
    tree: &mut Tree,
    ubridge: NodeId,
    executor: Arc<dyn CommandExecutor>,
    fd: RawFd,
) -> SidResult<()> {
    let observer = match select_idle_observer(tree, ubridge)? {
        Some(id) => id,
        None => spawn_worker(tree, ubridge, executor)?,
    };

    send_fd_to_observer(tree, observer, fd)?;
    on_event(tree, observer, WorkerEvent::ConnectionAssigned)?;

    // The fd has been duplicated into the worker's address space via
    // SCM_RIGHTS; this process has no further use for its own copy.
    let _ = nix::unistd::close(fd);
    Ok(())
}

fn send_fd_to_observer(tree: &Tree, observer: NodeId, fd: RawFd) -> SidResult<()> {
    let data = tree.get_data::<crate::observer::ObserverData>(observer)?;
    data.control.send_fd(fd).map_err(|e| SidError::Lifecycle(format!("failed handing fd to worker: {e}")))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
