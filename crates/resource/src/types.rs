// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource type descriptors: a name, an init/destroy hook pair, and the
//! two capability bits (owns-event-loop, has-watchdog) a node is tagged
//! with at construction.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use sid_core::SidResult;

/// What a resource type does on create/destroy. Re-architected from a
/// table of raw function pointers into a trait object: one vtable per
/// type instead of two bare fn pointers, dispatched once at the
/// construction site when the node is tagged with its `ResourceType`.
pub trait ResourceHooks: Send + Sync {
    /// Builds the node's user data from caller-supplied kickstart
    /// arguments. Failure here aborts the enclosing `create`.
    fn init(&self, kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>>;

    /// Tears down user data before the node's children are destroyed.
    /// Default is a no-op drop, since most resource types hold nothing
    /// beyond what `Drop` on the boxed data already releases.
    fn destroy(&self, _data: Box<dyn Any + Send>) {}
}

/// The two capability bits from the data model: does this resource type
/// own an event loop, and does it carry a watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub owns_event_loop: bool,
    pub has_watchdog: bool,
}

/// A resource type descriptor: name + hooks + capabilities. Shared via
/// `Arc` since many nodes of the same type (e.g. every `observer`) point
/// at the same descriptor.
pub struct ResourceType {
    pub name: &'static str,
    pub hooks: Arc<dyn ResourceHooks>,
    pub capabilities: Capabilities,
}

impl ResourceType {
    pub fn new(name: &'static str, hooks: Arc<dyn ResourceHooks>, capabilities: Capabilities) -> Arc<Self> {
        Arc::new(Self { name, hooks, capabilities })
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// `{restrict-walk-up, restrict-walk-down, disallow-isolation}` from the
/// data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags {
    pub restrict_walk_up: bool,
    pub restrict_walk_down: bool,
    pub disallow_isolation: bool,
}

impl NodeFlags {
    pub const NONE: Self = Self { restrict_walk_up: false, restrict_walk_down: false, disallow_isolation: false };
}

/// A trivial `ResourceHooks` for resource types with no init-time work
/// (e.g. plain grouping nodes like `ubridge`'s static children).
pub struct NoopHooks;

impl ResourceHooks for NoopHooks {
    fn init(&self, _kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>> {
        Ok(Box::new(()))
    }
}
