// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration types for a framed buffer.

/// Where the buffer's bytes actually live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `realloc`-grown contiguous heap region.
    Heap,
    /// Anonymous `memfd`, `ftruncate`-grown, mmapped writable. Intended for
    /// zero-copy handoff (e.g. to a forked worker that inherits the fd).
    Memfd,
}

/// How appended bytes are organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Appended bytes form a flat stream.
    Linear,
    /// Appended records form an iovec array over segments stored in the
    /// buffer region, written atomically via `writev`.
    Vector,
}

/// How framing is applied on top of the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The caller manages framing.
    Plain,
    /// First 4 bytes are reserved for a big-endian u32 giving the whole
    /// frame length including the prefix.
    SizePrefix,
}

/// `spec{backend, type, mode}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSpec {
    pub backend: Backend,
    pub shape: Shape,
    pub mode: Mode,
}

impl BufferSpec {
    pub const fn new(backend: Backend, shape: Shape, mode: Mode) -> Self {
        Self { backend, shape, mode }
    }
}

/// `init{size, alloc_step, limit}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInit {
    /// Initial allocation, in bytes.
    pub size: usize,
    /// Growth granularity: allocation always grows to the next multiple of
    /// this that satisfies the requested capacity.
    pub alloc_step: usize,
    /// Hard ceiling on `allocated`. `None` (or zero) means unbounded.
    pub limit: Option<usize>,
}

impl BufferInit {
    pub const fn new(size: usize, alloc_step: usize, limit: usize) -> Self {
        Self { size, alloc_step, limit: if limit == 0 { None } else { Some(limit) } }
    }
}

/// `usage{allocated, used}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferUsage {
    pub allocated: usize,
    pub used: usize,
}

/// Number of bytes the size-prefix mode reserves at the front of the frame.
pub const SIZE_PREFIX_LEN: usize = 4;
