// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observer/worker control channel: a `AF_UNIX` `SOCK_SEQPACKET`
//! socketpair used for two things — handing an accepted connection's
//! file descriptor to a worker via `SCM_RIGHTS`, and exchanging the
//! single-byte state signals (`RUNNING`, `IDLE`) that drive
//! [`crate::state::transition`].

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::cmsg_space;
use nix::sys::socket::{
    recvmsg, sendmsg, socketpair, AddressFamily, ControlMessage, ControlMessageOwned, MsgFlags,
    SockFlag, SockType, UnixAddr,
};
use nix::sys::uio::IoSlice;
use sid_core::{SidError, SidResult};

/// Byte sent by a worker once it has taken a handed-off connection and
/// started processing it.
pub const RUNNING_BYTE: u8 = 1;
/// Byte sent by a worker once it has finished processing a connection
/// and is ready for another.
pub const IDLE_BYTE: u8 = 2;

/// One end of the observer/worker control channel.
pub struct ControlChannel {
    fd: OwnedFd,
}

impl ControlChannel {
    /// Creates a connected pair. The first element is conventionally
    /// kept by the observer (parent), the second handed to the worker
    /// (child) across `fork`.
    pub fn pair() -> SidResult<(ControlChannel, ControlChannel)> {
        let (a, b) = socketpair(
            AddressFamily::Unix,
            SockType::SeqPacket,
            None,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
        )
        .map_err(SidError::from)?;
        Ok((ControlChannel { fd: a }, ControlChannel { fd: b }))
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Sends a single state-signal byte with no ancillary data.
    pub fn send_signal(&self, byte: u8) -> SidResult<()> {
        let iov = [IoSlice::new(std::slice::from_ref(&byte))];
        sendmsg::<UnixAddr>(self.fd.as_raw_fd(), &iov, &[], MsgFlags::empty(), None)
            .map_err(SidError::from)?;
        Ok(())
    }

    /// Reads a single state-signal byte, returning `None` on a clean
    /// peer shutdown (zero-length read).
    pub fn recv_signal(&self) -> SidResult<Option<u8>> {
        let mut buf = [0u8; 1];
        let mut iov = [std::io::IoSliceMut::new(&mut buf)];
        let msg = recvmsg::<UnixAddr>(self.fd.as_raw_fd(), &mut iov, None, MsgFlags::empty())
            .map_err(SidError::from)?;
        if msg.bytes == 0 {
            return Ok(None);
        }
        Ok(Some(buf[0]))
    }

    /// Hands `fd` to the peer via `SCM_RIGHTS`, along with a one-byte
    /// payload (unused by the receiver but required since an empty
    /// `SOCK_SEQPACKET` datagram with only ancillary data is rejected by
    /// some kernels).
    pub fn send_fd(&self, fd: RawFd) -> SidResult<()> {
        let marker = [0u8];
        let iov = [IoSlice::new(&marker)];
        let fds = [fd];
        let cmsg = [ControlMessage::ScmRights(&fds)];
        sendmsg::<UnixAddr>(self.fd.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
            .map_err(SidError::from)?;
        Ok(())
    }

    /// Receives a file descriptor handed over by [`ControlChannel::send_fd`].
    pub fn recv_fd(&self) -> SidResult<Option<OwnedFd>> {
        let mut marker = [0u8];
        let mut iov = [std::io::IoSliceMut::new(&mut marker)];
        let mut cmsg_buf = cmsg_space!([RawFd; 1]);
        let msg = recvmsg::<UnixAddr>(
            self.fd.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_buf),
            MsgFlags::empty(),
        )
        .map_err(SidError::from)?;
        if msg.bytes == 0 {
            return Ok(None);
        }
        for cmsg in msg.cmsgs().map_err(SidError::from)? {
            if let ControlMessageOwned::ScmRights(fds) = cmsg {
                if let Some(&raw) = fds.first() {
                    use std::os::fd::FromRawFd;
                    // SAFETY: the kernel just handed us ownership of this
                    // fd via SCM_RIGHTS; nothing else in the process
                    // holds it yet.
                    return Ok(Some(unsafe { OwnedFd::from_raw_fd(raw) }));
                }
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ControlChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlChannel").field("fd", &self.fd.as_raw_fd()).finish()
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
