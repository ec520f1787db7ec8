// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sidd`: the storage identification daemon binary. Binds the ubridge
//! socket, pre-forks nothing up front (the worker pool grows on demand
//! per `sid-worker`'s dispatch policy), and drives the resource tree's
//! event loop until a shutdown signal arrives.

fn main() -> std::process::ExitCode {
    sid_daemon::init_logging();

    let (mut tree, ubridge) = match sid_daemon::bootstrap() {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "failed to start sid daemon");
            return std::process::ExitCode::FAILURE;
        }
    };

    if let Err(e) = tree.run_event_loop(ubridge) {
        tracing::error!(error = %e, "sid daemon exited abnormally");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
