// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sid-daemon: wires the `ubridge` root resource, the pre-forked worker
//! pool, and the command pipeline into a runnable binary.

pub mod config;
mod logging;
mod shutdown;
mod ubridge;

use std::sync::Arc;

use sid_core::SidResult;
use sid_resource::Tree;

pub use ubridge::{bind_listener, create_ubridge};

pub use logging::init_logging;
pub use shutdown::install_shutdown_handlers;

/// Builds the daemon's resource tree: binds the listening socket, creates
/// the `ubridge` root, and installs the process-wide shutdown signal
/// handlers. Does not run the event loop — the caller decides when to
/// drive it (`main.rs` does so immediately; tests drive it manually).
pub fn bootstrap() -> SidResult<(Tree, sid_resource::NodeId)> {
    let socket_name = config::socket_name();
    tracing::info!(socket = %socket_name, protocol = %config::PROTOCOL_VERSION, "starting sid daemon");

    let listener = bind_listener(&socket_name)?;
    let executor: Arc<dyn sid_worker::CommandExecutor> = Arc::new(sid_command::Pipeline);

    let mut tree = Tree::new();
    let ubridge = create_ubridge(&mut tree, listener, executor)?;
    install_shutdown_handlers(&mut tree, ubridge)?;
    Ok((tree, ubridge))
}
