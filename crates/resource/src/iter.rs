// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `iter_create`/`next`/`previous`/`current`/`reset`/`destroy` from
//! the resource-tree contract: forward/backward iteration over a snapshot of a node's
//! child list taken at `iter_create` time. Destroying a child during
//! iteration is legal — the iterator simply skips slots that no longer
//! resolve.

use sid_core::SidResult;

use crate::tree::{NodeId, Tree};

pub struct ResourceIter {
    snapshot: Vec<NodeId>,
    pos: Option<usize>,
}

impl ResourceIter {
    /// `iter_create(node)`.
    pub fn create(tree: &Tree, node: NodeId) -> SidResult<Self> {
        Ok(Self { snapshot: tree.children_snapshot(node)?, pos: None })
    }

    /// `next()` — advances to the next live entry in the snapshot,
    /// skipping any that were destroyed since `iter_create`.
    pub fn next(&mut self, tree: &Tree) -> Option<NodeId> {
        loop {
            let candidate = match self.pos {
                None => 0,
                Some(p) => p + 1,
            };
            if candidate >= self.snapshot.len() {
                self.pos = Some(self.snapshot.len());
                return None;
            }
            self.pos = Some(candidate);
            let id = self.snapshot[candidate];
            if tree.contains(id) {
                return Some(id);
            }
        }
    }

    /// `previous()` — the backward counterpart to `next()`.
    pub fn previous(&mut self, tree: &Tree) -> Option<NodeId> {
        loop {
            let candidate = match self.pos {
                None | Some(0) => {
                    self.pos = None;
                    return None;
                }
                Some(p) => p - 1,
            };
            self.pos = Some(candidate);
            let id = self.snapshot[candidate];
            if tree.contains(id) {
                return Some(id);
            }
        }
    }

    /// `current()` — the entry `next`/`previous` last landed on, or
    /// `None` before the first call or after `reset`.
    pub fn current(&self) -> Option<NodeId> {
        self.pos.and_then(|p| self.snapshot.get(p).copied())
    }

    /// `reset()` — rewinds to the position before the first entry.
    pub fn reset(&mut self) {
        self.pos = None;
    }

    /// `destroy()` — releases the iterator. The snapshot holds no
    /// resources beyond the `Vec<NodeId>` itself, so this is a plain
    /// drop.
    pub fn destroy(self) {}
}

#[cfg(test)]
#[path = "iter_tests.rs"]
mod tests;
