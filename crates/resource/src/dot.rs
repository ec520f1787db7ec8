// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dump_all_in_dot(root)` — debug visualisation, "not semantically
//! required", so it's gated out of ordinary builds.

use std::fmt::Write as _;

use sid_core::SidResult;

use crate::tree::{NodeId, Tree};

/// Renders the subtree rooted at `root` as Graphviz `dot` text.
pub fn dump_all_in_dot(tree: &Tree, root: NodeId) -> SidResult<String> {
    let mut out = String::from("digraph resources {\n");
    write_node(tree, root, &mut out)?;
    out.push_str("}\n");
    Ok(out)
}

fn write_node(tree: &Tree, node: NodeId, out: &mut String) -> SidResult<()> {
    let id = tree.get_id(node)?;
    let _ = writeln!(out, "  \"{}\" [label=\"{}\"];", node.0, id);
    for child in tree.children_snapshot(node)? {
        let child_id = tree.get_id(child)?;
        let _ = writeln!(out, "  \"{}\" -> \"{}\";", id, child_id);
        write_node(tree, child, out)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "dot_tests.rs"]
mod tests;
