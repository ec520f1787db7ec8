// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forking a new worker process and registering its parent-side
//! observer node.
//!
//! The whole daemon process stays single-threaded: every event loop is
//! built on a `current_thread` tokio runtime, which never spawns extra
//! OS threads to run tasks. That's what makes calling the bare `fork(2)`
//! syscall here safe — there's no second thread that might be holding a
//! lock (allocator, tracing subscriber, …) at the moment of the fork.

use std::sync::Arc;

use nix::sys::signal::{sigprocmask, SigSet, SigmaskHow};
use nix::unistd::{fork, ForkResult};
use sid_core::{SidError, SidResult};
use sid_resource::{NodeFlags, NodeId, Tree};

use crate::control::ControlChannel;
use crate::executor::CommandExecutor;
use crate::observer::{observer_type, register_observer_watchers, ObserverKickstart};
use crate::worker_loop::run_worker;

/// Forks a new worker, returning the parent-side observer `NodeId` once
/// it's registered under `ubridge`.
pub fn spawn_worker(tree: &mut Tree, ubridge: NodeId, executor: Arc<dyn CommandExecutor>) -> SidResult<NodeId> {
    let (observer_end, worker_end) = ControlChannel::pair()?;

    let all_signals = SigSet::all();
    let mut old_mask = SigSet::empty();
    sigprocmask(SigmaskHow::SIG_SETMASK, Some(&all_signals), Some(&mut old_mask))
        .map_err(SidError::from)?;

    // SAFETY: the process is single-threaded (see module docs), so fork
    // duplicates exactly one thread's state; the child only performs
    // async-signal-safe work (restoring the signal mask, then handing
    // off into `run_worker`, which builds everything it needs from
    // scratch) before it ever touches the inherited heap state again.
    let fork_result = unsafe { fork() }.map_err(SidError::from);

    // Always restore our own mask, in both branches, before doing
    // anything else that might itself expect default signal delivery.
    let restore = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&old_mask), None);

    match fork_result? {
        ForkResult::Child => {
            drop(observer_end);
            restore.ok();
            run_worker(worker_end, executor);
            // run_worker only returns when the control channel closes
            // (parent gone) or a fatal error leaves nothing left to do.
            std::process::exit(0);
        }
        ForkResult::Parent { child } => {
            restore.map_err(SidError::from)?;
            drop(worker_end);
            let identifier = format!("worker-{}", child.as_raw());
            let kickstart = ObserverKickstart::new(child, observer_end);
            let node = tree.create(Some(ubridge), observer_type(), NodeFlags::NONE, identifier, &kickstart)?;
            register_observer_watchers(tree, node)?;
            tracing::debug!(pid = child.as_raw(), "spawned worker process");
            Ok(node)
        }
    }
}
