// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch table: decodes a frame, creates a transient command
//! resource as a child of the worker, runs the command's handler, and
//! writes the response frame back to the connection. `Pipeline` is the
//! daemon's sole implementor of [`sid_worker::CommandExecutor`].

use std::os::fd::RawFd;

use sid_core::{SidError, SidResult};
use sid_resource::{NodeId, Tree};
use sid_worker::CommandExecutor;

use crate::number::CommandNumber;
use crate::payload::decode_identify_payload;
use crate::phases::run_identify;
use crate::resource::create_command;
use crate::version::encode_version_payload;
use crate::wire::{build_response_frame, decode_frame, FrameHeader, UBRIDGE_PROTOCOL};

/// Bit 0 of the reply status: set on any failure, clear on success.
const STATUS_OVERALL_FAILED: u64 = 1 << 0;

#[derive(Default)]
pub struct Pipeline;

impl CommandExecutor for Pipeline {
    fn execute(&self, tree: &mut Tree, worker: NodeId, fd: RawFd, request: &[u8]) -> SidResult<()> {
        let (header, payload) = decode_frame(request)?;
        let number = CommandNumber::from_wire(header.cmd_number);

        if number == CommandNumber::Unknown {
            tracing::debug!(pid = std::process::id(), raw = header.cmd_number, "unknown command normalised to no-op");
        }

        let device = if number == CommandNumber::Identify {
            match decode_identify_payload(payload) {
                Ok(device) => Some(device),
                Err(e) => {
                    tracing::warn!(error = %e, "malformed identify payload");
                    return write_reply(fd, STATUS_OVERALL_FAILED, &[]);
                }
            }
        } else {
            None
        };

        let command = create_command(tree, worker, header, number, device)?;
        let outcome = run_command(tree, command, header, number);
        tree.destroy(command)?;

        match outcome {
            Ok(response_payload) => write_reply(fd, 0, &response_payload),
            Err(e) => {
                tracing::warn!(error = %e, "command execution failed");
                write_reply(fd, STATUS_OVERALL_FAILED, &[])
            }
        }
    }
}

fn write_reply(fd: RawFd, status: u64, payload: &[u8]) -> SidResult<()> {
    let mut frame = build_response_frame(CommandNumber::Reply.to_wire(), status, payload)?;
    frame.write(fd)?;
    Ok(())
}

/// Checks the protocol version, then runs `number` through the command
/// table. Returns the response payload on success.
fn run_command(tree: &mut Tree, command: NodeId, header: FrameHeader, number: CommandNumber) -> SidResult<Vec<u8>> {
    if header.protocol > UBRIDGE_PROTOCOL {
        return Err(SidError::Protocol(format!(
            "unsupported client protocol {} (daemon speaks {UBRIDGE_PROTOCOL})",
            header.protocol
        )));
    }

    match number {
        CommandNumber::Version => Ok(encode_version_payload().to_vec()),
        CommandNumber::Identify => match run_identify(tree, command)? {
            Ok(()) => Ok(Vec::new()),
            Err((phase, rc)) => Err(SidError::Lifecycle(format!("identify short-circuited at {phase} (rc {rc})"))),
        },
        CommandNumber::Checkpoint | CommandNumber::Reply | CommandNumber::Unknown => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
