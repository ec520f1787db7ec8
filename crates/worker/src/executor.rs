// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The boundary between a worker's connection-handling loop and whatever
//! actually interprets request frames. Kept as a trait so this crate
//! never needs to depend on the command pipeline — the pipeline depends
//! on this crate instead, implementing `CommandExecutor` against the
//! same `Tree` and connection fd the worker loop already owns.

use std::os::fd::RawFd;

use sid_core::SidResult;
use sid_resource::{NodeId, Tree};

/// Decodes one complete request frame, runs it, and writes the response
/// frame back to `fd`.
///
/// Implementations run synchronously on the worker's event-loop thread,
/// with exclusive access to the worker's own resource tree: a command
/// pipeline is expected to create its command as a child resource of
/// `worker` for the duration of the call and destroy it again before
/// returning, per the resource-tree lifecycle every other node follows.
/// Writing the response is the executor's own last step (mirroring the
/// command pipeline's "writes the buffer to the connection FD"), not the
/// worker loop's — the worker loop only knows frames exist, not their
/// shape.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, tree: &mut Tree, worker: NodeId, fd: RawFd, request: &[u8]) -> SidResult<()>;
}

impl<F> CommandExecutor for F
where
    F: Fn(&mut Tree, NodeId, RawFd, &[u8]) -> SidResult<()> + Send + Sync,
{
    fn execute(&self, tree: &mut Tree, worker: NodeId, fd: RawFd, request: &[u8]) -> SidResult<()> {
        self(tree, worker, fd, request)
    }
}
