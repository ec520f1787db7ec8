// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralised environment variable access for the daemon binary, in
//! the same style as an `env.rs`: resolve each knob from a well-known
//! variable with a hard-coded fallback, nothing more.

use std::time::Duration;

pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_SOCKET_NAME: &str = "sid-ubridge.socket";

/// Abstract-namespace socket name (no leading NUL byte — the listener
/// itself adds the abstract marker). `SID_SOCKET_PATH` overrides the
/// default.
pub fn socket_name() -> String {
    resolve_socket_name(std::env::var("SID_SOCKET_PATH").ok())
}

fn resolve_socket_name(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_SOCKET_NAME.to_string())
}

/// Idle-worker reap timeout. `sid_worker::observer` reads the same
/// `SID_IDLE_TIMEOUT_MS` variable directly; this is exposed here too so
/// the effective value can be logged at startup.
pub fn idle_timeout() -> Duration {
    resolve_idle_timeout(std::env::var("SID_IDLE_TIMEOUT_MS").ok())
}

fn resolve_idle_timeout(value: Option<String>) -> Duration {
    value.and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis).unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
