// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The framed buffer: two backends, two shapes, two framing
//! modes, used on every wire and internal channel in the daemon.

use std::os::fd::RawFd;

use nix::sys::uio::IoSlice;
use sid_core::SidError;

use crate::config::{Backend, BufferInit, BufferSpec, BufferUsage, Mode, Shape, SIZE_PREFIX_LEN};
use crate::storage::Storage;

/// A framed buffer. See module docs and the wire contract for the full behavioural
/// contract; this type is the single implementation shared by the
/// listening socket's request buffer, a command's result buffer, and the
/// observer↔worker control channel's ancillary payload.
pub struct Buffer {
    spec: BufferSpec,
    init: BufferInit,
    storage: Storage,
    used: usize,
    /// `(offset, len)` records into `storage`, populated only in
    /// [`Shape::Vector`]; written out via `writev` on `write()`.
    segments: Vec<(usize, usize)>,
}

impl Buffer {
    /// `create`
    pub fn create(spec: BufferSpec, init: BufferInit) -> Result<Self, SidError> {
        let initial = init.size.max(1);
        let storage = Storage::new(spec.backend, initial)?;
        Ok(Self { spec, init, storage, used: 0, segments: Vec::new() })
    }

    pub fn spec(&self) -> BufferSpec {
        self.spec
    }

    /// `destroy` Dropping a `Buffer` already releases the
    /// heap allocation or unmaps/closes the memfd; this is just the
    /// explicit, spec-named spelling of that.
    pub fn destroy(self) {}

    /// `add(bytes, len)`
    pub fn add(&mut self, bytes: &[u8]) -> Result<(), SidError> {
        self.reserve_prefix_if_needed()?;
        let start = self.used;
        self.ensure_capacity(bytes.len())?;
        self.storage.as_mut_slice()[start..start + bytes.len()].copy_from_slice(bytes);
        self.used += bytes.len();
        if self.spec.shape == Shape::Vector {
            self.segments.push((start, bytes.len()));
        }
        self.write_prefix();
        Ok(())
    }

    /// `fmt(fmt, args…)`, spelled as `std::fmt::Write` so
    /// callers use `write!(buffer, "...", ...)`.
    pub fn fmt_write(&mut self, args: std::fmt::Arguments<'_>) -> Result<(), SidError> {
        let text = std::fmt::format(args);
        self.add(text.as_bytes())
    }

    /// Reserve the 4-byte size-prefix slot the first time content is added
    /// to a fresh `SizePrefix`-mode buffer. Buffers filled exclusively via
    /// `read()` (e.g. the inbound request buffer) never take this path —
    /// the wire's own prefix lands at offset 0 as bytes arrive.
    fn reserve_prefix_if_needed(&mut self) -> Result<(), SidError> {
        if self.spec.mode == Mode::SizePrefix && self.used == 0 {
            self.ensure_capacity(SIZE_PREFIX_LEN)?;
            self.storage.as_mut_slice()[..SIZE_PREFIX_LEN].fill(0);
            self.used = SIZE_PREFIX_LEN;
        }
        Ok(())
    }

    fn write_prefix(&mut self) {
        if self.spec.mode == Mode::SizePrefix && self.used >= SIZE_PREFIX_LEN {
            let len = self.used as u32;
            self.storage.as_mut_slice()[..SIZE_PREFIX_LEN].copy_from_slice(&len.to_be_bytes());
        }
    }

    /// Growth rule: grow to the next multiple of
    /// `alloc_step` that fits `used + need`; fail with resource-exhausted
    /// if that exceeds `limit`.
    fn ensure_capacity(&mut self, need: usize) -> Result<(), SidError> {
        let required = self.used + need;
        if required <= self.storage.allocated() {
            return Ok(());
        }
        let step = self.init.alloc_step.max(1);
        let rounded = required.div_ceil(step) * step;
        if let Some(limit) = self.init.limit {
            if rounded > limit {
                return Err(SidError::ResourceExhausted(format!(
                    "buffer would grow to {rounded} bytes, exceeding limit {limit}"
                )));
            }
        }
        self.storage.grow_to(rounded)
    }

    /// `read(fd)`: reads up to one full frame in size-prefix
    /// mode, appending raw bytes after `used`. Returns bytes read, `Ok(0)`
    /// on EOF. `WouldBlock`/`Interrupted` are returned as errors for the
    /// caller's event-loop boundary to retry, not retried here.
    pub fn read(&mut self, fd: RawFd) -> Result<usize, SidError> {
        let want = if self.spec.mode == Mode::SizePrefix && self.used < SIZE_PREFIX_LEN {
            SIZE_PREFIX_LEN - self.used + 4096
        } else {
            4096
        };
        self.ensure_capacity(want)?;
        let start = self.used;
        let slice = &mut self.storage.as_mut_slice()[start..start + want];
        match nix::unistd::read(fd, slice) {
            Ok(0) => Ok(0),
            Ok(n) => {
                self.used += n;
                Ok(n)
            }
            Err(e) => Err(SidError::Io(std::io::Error::from(e))),
        }
    }

    /// `write(fd)`: writes the current frame, handling
    /// partial sends. Linear/plain shapes write with plain `write(2)`;
    /// vector shapes write every recorded segment atomically with
    /// `writev(2)`.
    pub fn write(&mut self, fd: RawFd) -> Result<usize, SidError> {
        match self.spec.shape {
            Shape::Linear => self.write_linear(fd),
            Shape::Vector => self.write_vector(fd),
        }
    }

    fn write_linear(&self, fd: RawFd) -> Result<usize, SidError> {
        let data = &self.storage.as_slice()[..self.used];
        let mut written = 0;
        while written < data.len() {
            match nix::unistd::write(
                // SAFETY: `fd` outlives this call; caller owns it.
                unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) },
                &data[written..],
            ) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(nix::Error::EINTR) => continue,
                Err(nix::Error::EAGAIN) if written > 0 => break,
                Err(e) => return Err(SidError::Io(std::io::Error::from(e))),
            }
        }
        Ok(written)
    }

    fn write_vector(&self, fd: RawFd) -> Result<usize, SidError> {
        let data = self.storage.as_slice();
        let slices: Vec<IoSlice<'_>> = self
            .segments
            .iter()
            .map(|&(off, len)| IoSlice::new(&data[off..off + len]))
            .collect();
        // SAFETY: `fd` outlives this call; caller owns it.
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
        let written = nix::sys::uio::writev(borrowed, &slices)
            .map_err(|e| SidError::Io(std::io::Error::from(e)))?;
        Ok(written)
    }

    /// `get_data`
    pub fn data(&self) -> &[u8] {
        &self.storage.as_slice()[..self.used]
    }

    /// `reset(size)`: truncate to `size` logical bytes,
    /// retaining the allocation. `reset(0)` also un-reserves the
    /// size-prefix slot so the next `add`/`fmt_write` reserves it again.
    pub fn reset(&mut self, size: usize) {
        self.used = size.min(self.storage.allocated());
        self.segments.retain(|&(off, _)| off < self.used);
    }

    /// `is_complete()` / the completion invariant:
    /// `used >= 4 && used >= be_u32(data[0..4])`.
    pub fn is_complete(&self) -> bool {
        if self.spec.mode != Mode::SizePrefix {
            return true;
        }
        if self.used < SIZE_PREFIX_LEN {
            return false;
        }
        let data = self.storage.as_slice();
        let prefix = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        self.used >= SIZE_PREFIX_LEN && self.used >= prefix
    }

    /// `stat()`
    pub fn stat(&self) -> BufferUsage {
        BufferUsage { allocated: self.storage.allocated(), used: self.used }
    }

    /// The memfd backing this buffer, if `backend == Memfd`, for zero-copy
    /// handoff via `SCM_RIGHTS`.
    pub fn fd(&self) -> Option<RawFd> {
        self.storage.fd()
    }
}

impl std::fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.add(s.as_bytes()).map_err(|_| std::fmt::Error)
    }
}

/// Convenience constructor matching the common heap/linear/size-prefix
/// shape used by the wire protocol and the observer↔worker control
/// channel.
pub fn wire_buffer(init: BufferInit) -> Result<Buffer, SidError> {
    Buffer::create(BufferSpec::new(Backend::Heap, Shape::Linear, Mode::SizePrefix), init)
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
