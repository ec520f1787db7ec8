// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle state machine.

/// Lifecycle state of a single worker, tracked from the observer side.
///
/// `Init` covers the window between handing a connection's file
/// descriptor to the worker and receiving its first "running"
/// acknowledgement; a worker that dies in that window looks the same to
/// the observer as one that dies mid-`Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Init,
    Running,
    Fini,
}

/// Events that drive [`WorkerState`] transitions, observed on the
/// control channel or the child-exit watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    ConnectionAssigned,
    ReportRunning,
    ReportIdle,
    IdleTimeout,
    ChildExit,
}

/// Applies `event` to `state`, returning the next state or `None` if the
/// transition is invalid in the current state (the caller should treat
/// that as a protocol error, not silently ignore it).
pub fn transition(state: WorkerState, event: WorkerEvent) -> Option<WorkerState> {
    use WorkerEvent::*;
    use WorkerState::*;
    match (state, event) {
        (_, ChildExit) => Some(Fini),
        (Idle, ConnectionAssigned) => Some(Init),
        (Init, ReportRunning) => Some(Running),
        (Running, ReportIdle) => Some(Idle),
        (Idle, IdleTimeout) => Some(Fini),
        _ => None,
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
