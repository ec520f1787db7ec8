// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two buffer backends: a plain heap `Vec<u8>`, and an anonymous
//! `memfd` mmapped writable for zero-copy handoff across `fork()`.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::num::NonZeroUsize;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::ptr::NonNull;

use nix::sys::memfd::{memfd_create, MFdFlags};
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use nix::unistd::ftruncate;
use sid_core::SidError;

/// Backing storage for a [`crate::Buffer`]. Both variants expose the same
/// `as_slice`/`as_mut_slice`/`grow_to` surface so `Buffer`'s append/read/
/// write logic doesn't need to know which one it's holding.
pub enum Storage {
    Heap(Vec<u8>),
    Memfd(MemfdRegion),
}

impl Storage {
    pub fn new(backend: crate::Backend, initial_len: usize) -> Result<Self, SidError> {
        match backend {
            crate::Backend::Heap => Ok(Storage::Heap(vec![0u8; initial_len])),
            crate::Backend::Memfd => Ok(Storage::Memfd(MemfdRegion::new(initial_len)?)),
        }
    }

    pub fn allocated(&self) -> usize {
        match self {
            Storage::Heap(v) => v.len(),
            Storage::Memfd(m) => m.len,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Heap(v) => v.as_slice(),
            Storage::Memfd(m) => m.as_slice(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Heap(v) => v.as_mut_slice(),
            Storage::Memfd(m) => m.as_mut_slice(),
        }
    }

    /// Grow (never shrink) to exactly `new_len` bytes, zero-filling the tail.
    pub fn grow_to(&mut self, new_len: usize) -> Result<(), SidError> {
        if new_len <= self.allocated() {
            return Ok(());
        }
        match self {
            Storage::Heap(v) => {
                v.resize(new_len, 0);
                Ok(())
            }
            Storage::Memfd(m) => m.grow_to(new_len),
        }
    }

    /// The raw fd backing this storage, for handoff via `SCM_RIGHTS`. Only
    /// meaningful for the `Memfd` variant.
    pub fn fd(&self) -> Option<RawFd> {
        match self {
            Storage::Heap(_) => None,
            Storage::Memfd(m) => Some(m.fd.as_fd().as_raw_fd()),
        }
    }
}

/// An anonymous `memfd`, `ftruncate`-grown, mmapped `MAP_SHARED` writable.
pub struct MemfdRegion {
    fd: OwnedFd,
    map: NonNull<u8>,
    len: usize,
}

// SAFETY: the mapping is exclusively owned by this struct; we never hand
// out aliasing `&mut` access concurrently with `&` access (the buffer that
// owns a `MemfdRegion` is itself `!Sync` by way of holding it behind a
// single-threaded event loop resource).
unsafe impl Send for MemfdRegion {}

impl MemfdRegion {
    fn new(initial_len: usize) -> Result<Self, SidError> {
        let name = CStr::from_bytes_with_nul(b"sid-buffer\0")
            .map_err(|e| SidError::Fatal(format!("bad memfd name: {e}")))?;
        let fd = memfd_create(name, MFdFlags::MFD_CLOEXEC)
            .map_err(|e| SidError::Io(std::io::Error::from(e)))?;
        let initial_len = initial_len.max(1);
        ftruncate(&fd, initial_len as i64).map_err(SidError::from)?;
        let map = map_fd(&fd, initial_len)?;
        Ok(Self { fd, map, len: initial_len })
    }

    fn grow_to(&mut self, new_len: usize) -> Result<(), SidError> {
        ftruncate(&self.fd, new_len as i64).map_err(SidError::from)?;
        // SAFETY: `self.map` was produced by a prior successful `mmap` of
        // `self.len` bytes over `self.fd`, which is still open.
        unsafe {
            munmap(self.map.cast(), self.len)
                .map_err(|e| SidError::Io(std::io::Error::from(e)))?;
        }
        self.map = map_fd(&self.fd, new_len)?;
        self.len = new_len;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `map` points at `len` mmapped bytes for the lifetime of
        // `self`.
        unsafe { std::slice::from_raw_parts(self.map.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: exclusive `&mut self` guarantees no other live reference
        // to this mapping.
        unsafe { std::slice::from_raw_parts_mut(self.map.as_ptr(), self.len) }
    }
}

impl Drop for MemfdRegion {
    fn drop(&mut self) {
        // SAFETY: `self.map` is this struct's own mapping, not shared.
        let _ = unsafe { munmap(self.map.cast(), self.len) };
    }
}

fn map_fd(fd: &OwnedFd, len: usize) -> Result<NonNull<u8>, SidError> {
    let nz_len = NonZeroUsize::new(len).ok_or_else(|| {
        SidError::InvalidArgument("memfd region length must be non-zero".to_string())
    })?;
    // SAFETY: `fd` is a valid, open memfd truncated to at least `len` bytes;
    // we map it `MAP_SHARED` read/write and keep exclusive ownership of the
    // returned mapping until `munmap` in `Drop`/`grow_to`.
    let ptr = unsafe {
        mmap(
            None,
            nz_len,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            fd,
            0,
        )
        .map_err(|e| SidError::Io(std::io::Error::from(e)))?
    };
    Ok(ptr.cast())
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
