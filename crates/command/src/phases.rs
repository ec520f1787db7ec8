// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `identify` command's fixed phase sequence: `ident`, `scan-pre`,
//! `scan-core-current`, `scan-core-next-basic`, `scan-core-next-extended`,
//! `scan-post`. Each phase is a function from the command resource to an
//! int; a negative return short-circuits the remaining phases.
//!
//! The trigger-action phases (`trigger-action-current`,
//! `trigger-action-next`) are part of the same phase enumeration in
//! principle but are reserved extension points: `identify` never invokes
//! them, and they're kept here only as no-op stubs a later pass could
//! wire in.
//!
//! `run_identify` models the resource-tree contract's "schedules a
//! deferred event source that runs once on the next loop tick" as a
//! direct, synchronous call instead of a real deferred registration.
//! Within one worker nothing else can run between a request's phases —
//! the worker commits to one connection at a time — so a genuine
//! deferred tick would add a scheduling hop with no observable
//! difference, while actually driving it would mean re-entering the
//! event loop from inside a callback, which the resource tree disallows.

use sid_core::SidResult;
use sid_resource::{NodeId, Tree};

use crate::resource::CommandData;

pub type Phase = fn(&mut Tree, NodeId) -> SidResult<i32>;

pub const IDENTIFY_PHASES: &[(&str, Phase)] = &[
    ("ident", ident),
    ("scan_pre", scan_pre),
    ("scan_core_current", scan_core_current),
    ("scan_core_next_basic", scan_core_next_basic),
    ("scan_core_next_extended", scan_core_next_extended),
    ("scan_post", scan_post),
];

/// Runs every phase in `IDENTIFY_PHASES` against `command` in order,
/// stopping at the first negative result.
pub fn run_identify(tree: &mut Tree, command: NodeId) -> SidResult<Result<(), (&'static str, i32)>> {
    for (name, phase) in IDENTIFY_PHASES {
        let rc = phase(tree, command)?;
        if rc < 0 {
            tracing::debug!(phase = *name, rc, "identify phase short-circuited");
            return Ok(Err((name, rc)));
        }
    }
    Ok(Ok(()))
}

fn ident(tree: &mut Tree, command: NodeId) -> SidResult<i32> {
    let data = tree.get_data::<CommandData>(command)?;
    tracing::debug!(device = ?data.device, "identify: ident phase");
    Ok(0)
}

fn scan_pre(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

/// The original daemon's `_init_device` call site has a parenthesisation
/// bug: `r = (_init_device(cmd_res) < 0)` assigns the boolean comparison
/// rather than the device-init return code, so a negative rc is silently
/// folded to `0` or `1` instead of propagating. This follows the
/// intended behaviour: propagate `init_device`'s own return value
/// unchanged.
fn scan_core_current(tree: &mut Tree, command: NodeId) -> SidResult<i32> {
    init_device(tree, command)
}

/// A device is only considered identified once it carries both a major
/// and minor number; `identify` payloads missing either short-circuit
/// the phase sequence here.
fn init_device(tree: &mut Tree, command: NodeId) -> SidResult<i32> {
    let data = tree.get_data::<CommandData>(command)?;
    let identified = data.device.as_ref().is_some_and(|d| d.major.is_some() && d.minor.is_some());
    if identified {
        Ok(0)
    } else {
        Ok(-1)
    }
}

fn scan_core_next_basic(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

fn scan_core_next_extended(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

fn scan_post(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

#[allow(dead_code)]
fn trigger_action_current(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

#[allow(dead_code)]
fn trigger_action_next(_tree: &mut Tree, _command: NodeId) -> SidResult<i32> {
    Ok(0)
}

#[cfg(test)]
#[path = "phases_tests.rs"]
mod tests;
