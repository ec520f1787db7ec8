// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seven error kinds shared across the resource tree, worker pool,
//! command pipeline, buffer, and KV store.

use thiserror::Error;

/// Crate-spanning error type. Individual crates may wrap this in a more
/// specific local error, but every failure ultimately maps onto one of
/// these kinds.
#[derive(Debug, Error)]
pub enum SidError {
    /// Malformed frame, unknown key, bad integers.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation or limit failure on a buffer or KV entry.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Socket/FD error. `EAGAIN`/`EINTR` are expected to be retried by the
    /// caller at the event-loop boundary rather than surfaced as this kind.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command number out of range, or unsupported protocol version.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Restricted walk, destroy of a node driving an active loop, failed
    /// child init.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Unrecoverable loop or fork failure; propagates to the top level.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl From<nix::Error> for SidError {
    fn from(err: nix::Error) -> Self {
        SidError::Io(std::io::Error::from(err))
    }
}

impl SidError {
    /// True for kinds marked retryable at the event-loop boundary
    /// (`EAGAIN`/`EINTR` on I/O).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SidError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
            )
        )
    }
}

pub type SidResult<T> = Result<T, SidError>;
