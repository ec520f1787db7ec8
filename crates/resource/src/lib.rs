// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sid-resource: the hierarchical, event-loop-bearing resource tree from
//! the resource-tree contract — scoped lifetime, typed children, iteration, isolation,
//! and per-node event sources (I/O, signal, child, timer, deferred).

mod event;
mod iter;
mod tree;
mod types;

#[cfg(any(test, feature = "dot-dump"))]
mod dot;

pub use event::{EventCallback, EventKind, EventSourceId, IoInterest};
pub use iter::ResourceIter;
pub use tree::{NodeId, Tree};
pub use types::{Capabilities, NodeFlags, NoopHooks, ResourceHooks, ResourceType};

#[cfg(any(test, feature = "dot-dump"))]
pub use dot::dump_all_in_dot;
