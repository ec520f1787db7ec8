// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(unsafe_code)]

//! Event sources and the event-loop handle each owns-event-loop node
//! carries. Re-architected onto `tokio`'s reactor (I/O, timer, signal)
//! instead of raw `epoll`, per the relaxation documented in DESIGN.md:
//! the loop still runs on a single thread and serialises handler
//! execution, preserving the concurrency model the protocol requires.

use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sid_core::{SidError, SidResult};

use crate::tree::{NodeId, Tree};

/// Opaque handle to a registered event source, unique within the owning
/// `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSourceId(usize);

#[derive(Default)]
pub(crate) struct EventSourceIdGen(AtomicUsize);

impl EventSourceIdGen {
    pub(crate) fn next(&self) -> EventSourceId {
        EventSourceId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Readiness interest for an I/O event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoInterest {
    pub readable: bool,
    pub writable: bool,
}

impl IoInterest {
    pub const READABLE: Self = Self { readable: true, writable: false };
    pub const WRITABLE: Self = Self { readable: false, writable: true };

    fn interest(self) -> tokio::io::Interest {
        match (self.readable, self.writable) {
            (true, true) => tokio::io::Interest::READABLE | tokio::io::Interest::WRITABLE,
            (true, false) => tokio::io::Interest::READABLE,
            (false, true) => tokio::io::Interest::WRITABLE,
            (false, false) => tokio::io::Interest::READABLE,
        }
    }
}

/// What a registered event source is waiting on, one variant per kind
/// from the data model.
pub enum EventKind {
    Io { fd: RawFd, interest: IoInterest },
    Signal { signum: i32 },
    ChildExit { pid: Pid },
    Timer { delay: Duration },
    Deferred,
}

/// The boxed handler invoked once the event source fires. Runs
/// synchronously on the loop thread with exclusive access to the tree.
pub type EventCallback = Box<dyn FnMut(&mut Tree, NodeId) -> SidResult<()> + Send>;

pub(crate) struct Source {
    pub(crate) node: NodeId,
    pub(crate) callback: EventCallback,
}

struct RawFdHandle(RawFd);

impl AsRawFd for RawFdHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// The event loop a node owns: a current-thread tokio runtime, the
/// cancellation token `exit_event_loop` trips, and the channel
/// background tasks use to report a fired source back to the central
/// dispatch loop.
///
/// Held behind `Arc` in the owning node so `run_event_loop` can clone
/// the handle out, release its borrow on the tree, and then drive it
/// with exclusive `&mut Tree` access — handlers that register new event
/// sources during dispatch still find the loop in place on the node.
pub struct EventLoop {
    rt: tokio::runtime::Runtime,
    cancel: CancellationToken,
    fired_tx: mpsc::UnboundedSender<EventSourceId>,
    fired_rx: Mutex<Option<mpsc::UnboundedReceiver<EventSourceId>>>,
}

impl EventLoop {
    pub fn new() -> SidResult<Arc<Self>> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SidError::Fatal(format!("failed to build event loop runtime: {e}")))?;
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        Ok(Arc::new(Self { rt, cancel: CancellationToken::new(), fired_tx, fired_rx: Mutex::new(Some(fired_rx)) }))
    }

    pub fn is_running(&self) -> bool {
        self.fired_rx.lock().is_none()
    }

    /// Spawns the background task that waits on `kind` and reports
    /// `id` back to the dispatcher once it fires.
    pub(crate) fn arm(&self, id: EventSourceId, kind: EventKind) {
        let tx = self.fired_tx.clone();
        match kind {
            EventKind::Deferred => {
                self.rt.spawn(async move {
                    tokio::task::yield_now().await;
                    let _ = tx.send(id);
                });
            }
            EventKind::Timer { delay } => {
                self.rt.spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(id);
                });
            }
            EventKind::Io { fd, interest } => {
                self.rt.spawn(async move {
                    let handle = RawFdHandle(fd);
                    let Ok(async_fd) = AsyncFd::with_interest(handle, interest.interest()) else {
                        return;
                    };
                    if interest.writable && !interest.readable {
                        if let Ok(mut guard) = async_fd.writable().await {
                            guard.clear_ready();
                        }
                    } else if let Ok(mut guard) = async_fd.readable().await {
                        guard.clear_ready();
                    }
                    let _ = tx.send(id);
                });
            }
            EventKind::Signal { signum } => {
                self.rt.spawn(async move {
                    let Ok(mut stream) =
                        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::from_raw(signum))
                    else {
                        return;
                    };
                    stream.recv().await;
                    let _ = tx.send(id);
                });
            }
            EventKind::ChildExit { pid } => {
                self.rt.spawn(async move {
                    loop {
                        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                            Ok(WaitStatus::StillAlive) => {
                                tokio::time::sleep(Duration::from_millis(50)).await;
                            }
                            Ok(_) | Err(_) => break,
                        }
                    }
                    let _ = tx.send(id);
                });
            }
        }
    }

    /// Drives the dispatch loop until `exit_event_loop` cancels the
    /// token or the fired-event channel closes. Handlers run on this
    /// thread, one at a time, with exclusive `&mut Tree` access.
    pub(crate) fn drive(&self, tree: &mut Tree) -> SidResult<()> {
        let mut fired_rx = self
            .fired_rx
            .lock()
            .take()
            .ok_or_else(|| SidError::Lifecycle("event loop is already running".into()))?;
        let cancel = self.cancel.clone();
        self.rt.block_on(async {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    maybe_id = fired_rx.recv() => {
                        match maybe_id {
                            Some(id) => {
                                if let Err(e) = tree.dispatch(id) {
                                    tracing::warn!(error = %e, "event source handler failed");
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
        });
        *self.fired_rx.lock() = Some(fired_rx);
        Ok(())
    }

    pub(crate) fn exit(&self) {
        self.cancel.cancel();
    }
}
