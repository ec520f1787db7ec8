// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The value-semantics table

use std::sync::Arc;

/// What the caller hands to [`crate::Store::set`]. `Scalar` maps to the
/// `VECTOR=0` rows of the table, `Vector` to the `VECTOR=1` rows.
///
/// Both variants carry `Arc<[u8]>` rather than a borrowed slice: the `REF`
/// flag means "share the caller's allocation" (an `Arc` clone, no bytes
/// copied), which only a refcounted input can honour without unsafe
/// aliasing. Callers that don't already hold an `Arc` construct one with
/// `Arc::from(vec)` at the call site — that allocation is the "same
/// pointer" the table refers to.
#[derive(Debug, Clone)]
pub enum Input {
    Scalar(Arc<[u8]>),
    Vector(Vec<Arc<[u8]>>),
}

/// `{VECTOR, REF, MERGE}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetFlags {
    pub vector: bool,
    pub reference: bool,
    pub merge: bool,
}

impl SetFlags {
    pub const fn new(vector: bool, reference: bool, merge: bool) -> Self {
        Self { vector, reference, merge }
    }
}

/// How a value ended up stored, one variant per distinct "Stored value"
/// column in the table below.
#[derive(Debug, Clone)]
pub enum StoredValue {
    /// `VECTOR=0`: a deep copy (`REF=0`) or the caller's own allocation
    /// (`REF=1`).
    Scalar(Arc<[u8]>),
    /// `VECTOR=1, REF=0, MERGE=0`: a deep copy of every segment.
    /// `VECTOR=1, REF=1, MERGE=0`: the caller's own segments, shared.
    Segments(Vec<Arc<[u8]>>),
    /// `VECTOR=1, REF=0, MERGE=1`: segments concatenated into one
    /// contiguous value.
    Contiguous(Arc<[u8]>),
    /// `VECTOR=1, REF=1, MERGE=1`: a contiguous value, plus an iovec of
    /// `(offset, len)` views into it (a safe stand-in for "pointers into
    /// it" — a raw iovec, expressed without a self-referential
    /// struct).
    ContiguousWithView(Arc<[u8]>, Vec<(usize, usize)>),
}

impl StoredValue {
    pub fn build(input: Input, flags: SetFlags) -> (StoredValue, usize) {
        match (input, flags.vector, flags.reference, flags.merge) {
            (Input::Scalar(bytes), false, false, _) => {
                let copy: Arc<[u8]> = Arc::from(bytes.as_ref());
                let size = copy.len();
                (StoredValue::Scalar(copy), size)
            }
            (Input::Scalar(bytes), false, true, _) => {
                let size = bytes.len();
                (StoredValue::Scalar(bytes), size)
            }
            (Input::Vector(segments), true, false, false) => {
                let copies: Vec<Arc<[u8]>> =
                    segments.iter().map(|s| Arc::from(s.as_ref())).collect();
                let size = copies.len();
                (StoredValue::Segments(copies), size)
            }
            (Input::Vector(segments), true, false, true) => {
                let total: usize = segments.iter().map(|s| s.len()).sum();
                let mut merged = Vec::with_capacity(total);
                for s in &segments {
                    merged.extend_from_slice(s);
                }
                let merged: Arc<[u8]> = Arc::from(merged.into_boxed_slice());
                let size = merged.len();
                (StoredValue::Contiguous(merged), size)
            }
            (Input::Vector(segments), true, true, false) => {
                let size = segments.len();
                (StoredValue::Segments(segments), size)
            }
            (Input::Vector(segments), true, true, true) => {
                let total: usize = segments.iter().map(|s| s.len()).sum();
                let mut merged = Vec::with_capacity(total);
                let mut views = Vec::with_capacity(segments.len());
                for s in &segments {
                    views.push((merged.len(), s.len()));
                    merged.extend_from_slice(s);
                }
                let merged: Arc<[u8]> = Arc::from(merged.into_boxed_slice());
                let size = merged.len();
                (StoredValue::ContiguousWithView(merged, views), size)
            }
            // `vector == false` with `Input::Vector` (or vice versa) is a
            // caller error; treat it as the scalar/copy behaviour rather
            // than panicking, since `set` already validates flag/input
            // agreement before reaching here.
            (Input::Scalar(bytes), true, _, _) => {
                let copy: Arc<[u8]> = Arc::from(bytes.as_ref());
                let size = copy.len();
                (StoredValue::Scalar(copy), size)
            }
            (Input::Vector(segments), false, _, _) => {
                let total: usize = segments.iter().map(|s| s.len()).sum();
                let mut merged = Vec::with_capacity(total);
                for s in &segments {
                    merged.extend_from_slice(s);
                }
                let merged: Arc<[u8]> = Arc::from(merged.into_boxed_slice());
                let size = merged.len();
                (StoredValue::Contiguous(merged), size)
            }
        }
    }

    /// Materialises the logical byte content, for comparison/inspection.
    /// Cheap for `Scalar`/`Contiguous`/`ContiguousWithView`; allocates for
    /// `Segments`.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            StoredValue::Scalar(b) | StoredValue::Contiguous(b) => b.to_vec(),
            StoredValue::ContiguousWithView(b, _) => b.to_vec(),
            StoredValue::Segments(segs) => segs.iter().flat_map(|s| s.iter().copied()).collect(),
        }
    }

    /// True if `other` is the exact same allocation this value holds
    /// (only meaningful for `REF`-stored scalars).
    pub fn is_same_allocation(&self, other: &Arc<[u8]>) -> bool {
        match self {
            StoredValue::Scalar(b) => Arc::ptr_eq(b, other),
            _ => false,
        }
    }
}

/// A KV entry: composite key, stored value, flags it was set with, and
/// its reported size.
#[derive(Debug, Clone)]
pub struct Entry {
    pub prefix: String,
    pub key: String,
    pub value: StoredValue,
    pub flags: SetFlags,
    pub size: usize,
}

impl Entry {
    pub fn composite_key(prefix: &str, key: &str) -> String {
        format!("{prefix}:{key}")
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
