// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The KV store itself: `set`/`get`/`unset`/snapshot iteration.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;

use crate::entry::{Entry, Input, SetFlags, StoredValue};

/// Confirms a conflicting `set`: return `true` to replace the existing
/// entry, `false` to keep it. With no resolver, `set` always replaces.
pub type SetResolver<'a> = &'a mut dyn FnMut(&str, &str, &Entry, &Input) -> bool;

/// Confirms an `unset`: return `true` to allow removal, `false` to
/// decline it.
pub type UnsetResolver<'a> = &'a mut dyn FnMut(&str, &str, &Entry) -> bool;

/// Marker re-export so call sites that only need "some resolver type"
/// don't have to pick between Set/Unset explicitly.
pub type Resolver<'a> = SetResolver<'a>;

/// Chained-hash KV store keyed by the composite `prefix:key` string.
/// Backed by `std::collections::HashMap`; the store has no
/// ordering requirement, so there's no reason to pull in an ordered map.
#[derive(Default)]
pub struct Store {
    entries: HashMap<String, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: HashMap::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `set(prefix, key, value, size, flags, resolver, resolver_arg)` from
    /// the wire contract `resolver_arg` is folded into the closure the caller
    /// passes for `resolver` (idiomatic Rust closures capture their own
    /// state; there's no need for a separate `void*` parameter).
    pub fn set(
        &mut self,
        prefix: &str,
        key: &str,
        input: Input,
        flags: SetFlags,
        resolver: Option<SetResolver<'_>>,
    ) -> &Entry {
        let composite = Entry::composite_key(prefix, key);
        match self.entries.entry(composite) {
            MapEntry::Occupied(mut occ) => {
                let replace = match resolver {
                    Some(f) => f(prefix, key, occ.get(), &input),
                    None => true,
                };
                if replace {
                    let (value, size) = StoredValue::build(input, flags);
                    occ.insert(Entry {
                        prefix: prefix.to_string(),
                        key: key.to_string(),
                        value,
                        flags,
                        size,
                    });
                }
                occ.into_mut()
            }
            MapEntry::Vacant(vac) => {
                let (value, size) = StoredValue::build(input, flags);
                vac.insert(Entry { prefix: prefix.to_string(), key: key.to_string(), value, flags, size })
            }
        }
    }

    /// `get(prefix, key, &size) → ptr` Returns `None` (size
    /// 0) if absent.
    pub fn get(&self, prefix: &str, key: &str) -> Option<&Entry> {
        self.entries.get(&Entry::composite_key(prefix, key))
    }

    /// `unset(prefix, key, resolver, arg)` Returns `true`
    /// if the entry was removed (or was already absent — nothing to
    /// decline), `false` if a resolver declined the removal.
    pub fn unset(&mut self, prefix: &str, key: &str, resolver: Option<UnsetResolver<'_>>) -> bool {
        let composite = Entry::composite_key(prefix, key);
        let Some(entry) = self.entries.get(&composite) else {
            return true;
        };
        if let Some(f) = resolver {
            if !f(prefix, key, entry) {
                return false;
            }
        }
        self.entries.remove(&composite);
        true
    }

    /// Snapshot-based iteration: mutation during iteration is
    /// undefined per spec, so the snapshot is a plain clone taken at call
    /// time rather than a live view.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
