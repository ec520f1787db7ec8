// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pre-forked worker pool: one observer node per child process, a
//! control-channel protocol for handing accepted connections to an idle
//! worker, and the worker-side loop that turns a connection into request
//! frames fed to a caller-supplied executor.
//!
//! This crate never depends on the command pipeline directly. The
//! worker loop calls out through the [`CommandExecutor`] trait, and the
//! binary crate that assembles the pool wires the real command dispatch
//! in. That keeps the dependency graph a line (core, resource, buffer →
//! worker) rather than a cycle, even though at runtime a worker's whole
//! reason to exist is running commands.

mod control;
mod dispatch;
mod executor;
mod observer;
mod spawn;
mod state;
mod worker_loop;

pub use control::{ControlChannel, IDLE_BYTE, RUNNING_BYTE};
pub use dispatch::dispatch_connection;
pub use executor::CommandExecutor;
pub use observer::{observer_state, ObserverData};
pub use spawn::spawn_worker;
pub use state::WorkerState;
pub use worker_loop::run_worker;
