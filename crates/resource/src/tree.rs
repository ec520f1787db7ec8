// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resource tree: `create`/`destroy`, accessors, iteration,
//! structural mutation, and event-source registration.
//!
//! Nodes live in a single arena (`Vec<Option<Node>>`) addressed by
//! `NodeId` as a non-owning reference resolved through the arena —
//! parent/child links are indices, not `Rc`/`RefCell` cycles. A `Tree`
//! may hold more than one
//! root at once: `isolate`/`isolate_with_children` just clear a node's
//! parent link, and a freshly-forked process starts from an empty arena
//! and creates its own root.

use std::any::Any;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

use nix::unistd::Pid;
use sid_core::{SidError, SidResult};

use crate::event::{EventCallback, EventKind, EventLoop, EventSourceId, EventSourceIdGen, IoInterest, Source};
use crate::types::{NodeFlags, ResourceType};

/// Index into a `Tree`'s node arena. Never reused even after the slot is
/// freed by `destroy`, so a stale `NodeId` reliably resolves to
/// "missing" rather than aliasing a later, unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

pub(crate) struct Node {
    #[allow(dead_code)]
    id: NodeId,
    type_: Arc<ResourceType>,
    identifier: String,
    flags: NodeFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    event_loop: Option<Arc<EventLoop>>,
    event_sources: Vec<EventSourceId>,
    data: Option<Box<dyn Any + Send>>,
}

#[derive(Default)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    sources: std::collections::HashMap<EventSourceId, Source>,
    source_ids: EventSourceIdGen,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, node: NodeId) -> SidResult<&Node> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.as_ref())
            .ok_or_else(|| SidError::InvalidArgument(format!("no such resource node {:?}", node)))
    }

    fn slot_mut(&mut self, node: NodeId) -> SidResult<&mut Node> {
        self.nodes
            .get_mut(node.0)
            .and_then(|n| n.as_mut())
            .ok_or_else(|| SidError::InvalidArgument(format!("no such resource node {:?}", node)))
    }

    /// `create(parent, type, flags, id, kickstart)` — the resource-tree contract
    pub fn create(
        &mut self,
        parent: Option<NodeId>,
        type_: Arc<ResourceType>,
        flags: NodeFlags,
        identifier: impl Into<String>,
        kickstart: &dyn Any,
    ) -> SidResult<NodeId> {
        if let Some(p) = parent {
            self.slot(p)?;
        }
        let event_loop = if type_.capabilities.owns_event_loop { Some(EventLoop::new()?) } else { None };
        let data = type_.hooks.init(kickstart)?;
        let node = Node {
            id: NodeId(0),
            type_,
            identifier: identifier.into(),
            flags,
            parent,
            children: Vec::new(),
            event_loop,
            event_sources: Vec::new(),
            data: Some(data),
        };
        let id = NodeId(self.nodes.len());
        let mut node = node;
        node.id = id;
        self.nodes.push(Some(node));
        if let Some(p) = parent {
            self.slot_mut(p)?.children.push(id);
        }
        tracing::debug!(node = id.0, parent = ?parent.map(|p| p.0), "resource created");
        Ok(id)
    }

    /// `destroy(node)` — recursive post-order: a node's own event
    /// sources, then its children (each fully destroyed), then its
    /// destroy hook.
    pub fn destroy(&mut self, node: NodeId) -> SidResult<()> {
        self.destroy_inner(node, true)
    }

    fn destroy_inner(&mut self, node: NodeId, detach_from_parent: bool) -> SidResult<()> {
        if let Some(el) = &self.slot(node)?.event_loop {
            if el.is_running() {
                return Err(SidError::Lifecycle(format!(
                    "cannot destroy node {:?}: it is driving an active event loop",
                    node
                )));
            }
        }

        let source_ids = std::mem::take(&mut self.slot_mut(node)?.event_sources);
        for sid in source_ids {
            self.sources.remove(&sid);
        }

        let children = self.slot(node)?.children.clone();
        for child in children {
            self.destroy_inner(child, false)?;
        }

        let (type_, data) = {
            let n = self.slot_mut(node)?;
            (Arc::clone(&n.type_), n.data.take())
        };
        if let Some(data) = data {
            type_.hooks.destroy(data);
        }

        if detach_from_parent {
            if let Some(parent) = self.slot(node)?.parent {
                if let Ok(p) = self.slot_mut(parent) {
                    p.children.retain(|&c| c != node);
                }
            }
        }

        self.nodes[node.0] = None;
        tracing::debug!(node = node.0, "resource destroyed");
        Ok(())
    }

    pub fn get_data<T: 'static>(&self, node: NodeId) -> SidResult<&T> {
        self.slot(node)?
            .data
            .as_ref()
            .and_then(|d| d.downcast_ref::<T>())
            .ok_or_else(|| SidError::InvalidArgument("user data type mismatch".into()))
    }

    pub fn get_data_mut<T: 'static>(&mut self, node: NodeId) -> SidResult<&mut T> {
        self.slot_mut(node)?
            .data
            .as_mut()
            .and_then(|d| d.downcast_mut::<T>())
            .ok_or_else(|| SidError::InvalidArgument("user data type mismatch".into()))
    }

    pub fn get_id(&self, node: NodeId) -> SidResult<&str> {
        Ok(&self.slot(node)?.identifier)
    }

    /// The `/`-joined path from root, stopping at a `restrict-walk-up`
    /// boundary.
    pub fn get_full_id(&self, node: NodeId) -> SidResult<String> {
        let mut segments = vec![self.slot(node)?.identifier.clone()];
        let mut cur = node;
        loop {
            let n = self.slot(cur)?;
            if n.flags.restrict_walk_up {
                break;
            }
            match n.parent {
                Some(p) => {
                    segments.push(self.slot(p)?.identifier.clone());
                    cur = p;
                }
                None => break,
            }
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    /// `get_parent` — stops at a `restrict-walk-up` boundary (returns
    /// `None` as if the node had no parent).
    pub fn get_parent(&self, node: NodeId) -> SidResult<Option<NodeId>> {
        let n = self.slot(node)?;
        if n.flags.restrict_walk_up {
            return Ok(None);
        }
        Ok(n.parent)
    }

    pub fn get_top_level(&self, node: NodeId) -> SidResult<NodeId> {
        let mut cur = node;
        loop {
            let n = self.slot(cur)?;
            if n.flags.restrict_walk_up {
                return Ok(cur);
            }
            match n.parent {
                Some(p) => cur = p,
                None => return Ok(cur),
            }
        }
    }

    pub fn is_type_of(&self, node: NodeId, type_name: &str) -> SidResult<bool> {
        Ok(self.slot(node)?.type_.name == type_name)
    }

    /// Walks upward from `node`, stopping at a `restrict-walk-up`
    /// boundary, looking for an ancestor of `type_name`.
    pub fn is_ancestor_of_type(&self, node: NodeId, type_name: &str) -> SidResult<bool> {
        let mut cur = self.get_parent(node)?;
        while let Some(id) = cur {
            if self.slot(id)?.type_.name == type_name {
                return Ok(true);
            }
            cur = self.get_parent(id)?;
        }
        Ok(false)
    }

    /// O(children) lookup by `(type, id)`.
    pub fn get_child(&self, node: NodeId, type_name: &str, identifier: &str) -> SidResult<Option<NodeId>> {
        for &child in &self.slot(node)?.children {
            let n = self.slot(child)?;
            if n.type_.name == type_name && n.identifier == identifier {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    pub fn children_snapshot(&self, node: NodeId) -> SidResult<Vec<NodeId>> {
        Ok(self.slot(node)?.children.clone())
    }

    /// Whether `node` still resolves to a live slot (used by
    /// [`crate::iter::ResourceIter`] to skip entries destroyed mid-iteration).
    pub fn contains(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node.0), Some(Some(_)))
    }

    /// Reparents an existing node. Detaches it from its current parent
    /// (if any) first; fails with `invalid-argument` if `parent` is a
    /// descendant of `child` (would create a cycle).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SidResult<()> {
        if parent == child || self.is_ancestor(child, parent)? {
            return Err(SidError::InvalidArgument("add_child would create a cycle".into()));
        }
        if let Some(old_parent) = self.slot(child)?.parent {
            self.slot_mut(old_parent)?.children.retain(|&c| c != child);
        }
        self.slot_mut(parent)?.children.push(child);
        self.slot_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn is_ancestor(&self, maybe_ancestor: NodeId, node: NodeId) -> SidResult<bool> {
        let mut cur = self.slot(node)?.parent;
        while let Some(p) = cur {
            if p == maybe_ancestor {
                return Ok(true);
            }
            cur = self.slot(p)?.parent;
        }
        Ok(false)
    }

    fn check_isolatable(&self, node: NodeId) -> SidResult<()> {
        if self.slot(node)?.flags.disallow_isolation {
            return Err(SidError::Lifecycle(format!("node {:?} disallows isolation", node)));
        }
        Ok(())
    }

    /// Detaches `node` to become a new root, re-parenting its own
    /// children up to its former parent so only `node` itself leaves
    /// the subtree.
    pub fn isolate(&mut self, node: NodeId) -> SidResult<()> {
        self.check_isolatable(node)?;
        let parent = self.slot(node)?.parent;
        let children = self.slot(node)?.children.clone();
        if let Some(grandparent) = parent {
            for &child in &children {
                self.slot_mut(child)?.parent = Some(grandparent);
            }
            self.slot_mut(grandparent)?.children.retain(|&c| c != node);
            self.slot_mut(grandparent)?.children.extend(children.iter().copied());
            self.slot_mut(node)?.children.clear();
        }
        self.slot_mut(node)?.parent = None;
        Ok(())
    }

    /// Detaches the whole subtree rooted at `node` (node and all its
    /// descendants move together) to become a new root.
    pub fn isolate_with_children(&mut self, node: NodeId) -> SidResult<()> {
        self.check_isolatable(node)?;
        if let Some(parent) = self.slot(node)?.parent {
            self.slot_mut(parent)?.children.retain(|&c| c != node);
        }
        self.slot_mut(node)?.parent = None;
        Ok(())
    }

    fn nearest_event_loop(&self, node: NodeId) -> SidResult<NodeId> {
        let mut cur = Some(node);
        while let Some(id) = cur {
            let n = self.slot(id)?;
            if n.event_loop.is_some() {
                return Ok(id);
            }
            cur = n.parent;
        }
        Err(SidError::Lifecycle("no ancestor owns an event loop".into()))
    }

    fn create_event_source(&mut self, node: NodeId, kind: EventKind, callback: EventCallback) -> SidResult<EventSourceId> {
        let loop_node = self.nearest_event_loop(node)?;
        let id = self.source_ids.next();
        self.sources.insert(id, Source { node, callback });
        self.slot_mut(node)?.event_sources.push(id);
        let el = self
            .slot(loop_node)?
            .event_loop
            .clone()
            .ok_or_else(|| SidError::Fatal("nearest_event_loop resolved to a node without a loop".into()))?;
        el.arm(id, kind);
        Ok(id)
    }

    pub fn create_io_event_source(
        &mut self,
        node: NodeId,
        fd: RawFd,
        interest: IoInterest,
        callback: EventCallback,
    ) -> SidResult<EventSourceId> {
        self.create_event_source(node, EventKind::Io { fd, interest }, callback)
    }

    pub fn create_signal_event_source(
        &mut self,
        node: NodeId,
        signum: i32,
        callback: EventCallback,
    ) -> SidResult<EventSourceId> {
        self.create_event_source(node, EventKind::Signal { signum }, callback)
    }

    pub fn create_child_event_source(
        &mut self,
        node: NodeId,
        pid: Pid,
        callback: EventCallback,
    ) -> SidResult<EventSourceId> {
        self.create_event_source(node, EventKind::ChildExit { pid }, callback)
    }

    pub fn create_timer_event_source(
        &mut self,
        node: NodeId,
        delay: Duration,
        callback: EventCallback,
    ) -> SidResult<EventSourceId> {
        self.create_event_source(node, EventKind::Timer { delay }, callback)
    }

    pub fn create_deferred_event_source(&mut self, node: NodeId, callback: EventCallback) -> SidResult<EventSourceId> {
        self.create_event_source(node, EventKind::Deferred, callback)
    }

    /// Destroys a specific event source before its owning resource is
    /// destroyed (e.g. cancelling the idle-timeout timer on an INIT/IDLE
    /// transition).
    pub fn destroy_event_source(&mut self, id: EventSourceId) -> SidResult<()> {
        if let Some(source) = self.sources.remove(&id) {
            if let Ok(n) = self.slot_mut(source.node) {
                n.event_sources.retain(|&s| s != id);
            }
        }
        Ok(())
    }

    pub(crate) fn dispatch(&mut self, id: EventSourceId) -> SidResult<()> {
        let Some(mut source) = self.sources.remove(&id) else {
            return Ok(());
        };
        if let Ok(n) = self.slot_mut(source.node) {
            n.event_sources.retain(|&s| s != id);
        }
        (source.callback)(self, source.node)
    }

    /// `run_event_loop(node)` — blocks driving `node`'s event loop until
    /// `exit_event_loop` is called from within a handler.
    pub fn run_event_loop(&mut self, node: NodeId) -> SidResult<()> {
        let event_loop = self
            .slot(node)?
            .event_loop
            .clone()
            .ok_or_else(|| SidError::Lifecycle(format!("node {:?} does not own an event loop", node)))?;
        event_loop.drive(self)
    }

    pub fn exit_event_loop(&mut self, node: NodeId) -> SidResult<()> {
        let event_loop = self
            .slot(node)?
            .event_loop
            .clone()
            .ok_or_else(|| SidError::Lifecycle(format!("node {:?} does not own an event loop", node)))?;
        event_loop.exit();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
