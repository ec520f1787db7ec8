// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful shutdown: `SIGTERM`/`SIGINT` delivered to the daemon process
//! stop the `ubridge` event loop and fan a `SIGTERM` out to every live
//! worker PID, mirroring the teacher's own drain-on-shutdown behaviour
//! but scoped to worker processes rather than agent sessions.

use nix::sys::signal::{kill, Signal};
use sid_core::SidResult;
use sid_resource::{NodeId, Tree};

pub fn install_shutdown_handlers(tree: &mut Tree, ubridge: NodeId) -> SidResult<()> {
    for signal in [Signal::SIGTERM, Signal::SIGINT] {
        tree.create_signal_event_source(
            ubridge,
            signal as i32,
            Box::new(|tree, node| {
                tracing::info!("shutdown signal received; stopping worker pool");
                signal_all_workers(tree, node);
                tree.exit_event_loop(node)
            }),
        )?;
    }
    Ok(())
}

fn signal_all_workers(tree: &Tree, ubridge: NodeId) {
    let Ok(children) = tree.children_snapshot(ubridge) else { return };
    for child in children {
        if tree.is_type_of(child, "observer").unwrap_or(false) {
            if let Ok(data) = tree.get_data::<sid_worker::ObserverData>(child) {
                let _ = kill(data.pid, Signal::SIGTERM);
            }
        }
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
