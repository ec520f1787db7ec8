// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing shared by requests and responses: a 4-byte big-endian
//! length prefix, a fixed 10-byte header (protocol, command number,
//! status), then a command-specific payload.

use sid_buffer::{Backend, Buffer, BufferInit, BufferSpec, Mode, Shape};
use sid_core::{SidError, SidResult};

/// Protocol version this daemon speaks. Requests declaring a higher
/// version are rejected rather than downgraded.
pub const UBRIDGE_PROTOCOL: u8 = 1;

/// `protocol(1) + cmd_number(1) + status(8)`.
pub const HEADER_LEN: usize = 10;
pub const PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub protocol: u8,
    pub cmd_number: u8,
    pub status: u64,
}

impl FrameHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.protocol);
        out.push(self.cmd_number);
        out.extend_from_slice(&self.status.to_be_bytes());
    }
}

/// Decodes a complete, already-buffered frame (length prefix included)
/// into its header and payload slice.
pub fn decode_frame(frame: &[u8]) -> SidResult<(FrameHeader, &[u8])> {
    if frame.len() < PREFIX_LEN + HEADER_LEN {
        return Err(SidError::InvalidArgument(format!(
            "frame too short: {} bytes, need at least {}",
            frame.len(),
            PREFIX_LEN + HEADER_LEN
        )));
    }
    let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if declared != frame.len() {
        return Err(SidError::InvalidArgument(format!(
            "frame length prefix ({declared}) does not match buffered length ({})",
            frame.len()
        )));
    }
    let status_bytes: [u8; 8] = frame[6..14]
        .try_into()
        .map_err(|_| SidError::Fatal("header status slice was not 8 bytes".into()))?;
    let header = FrameHeader { protocol: frame[4], cmd_number: frame[5], status: u64::from_be_bytes(status_bytes) };
    Ok((header, &frame[PREFIX_LEN + HEADER_LEN..]))
}

/// Builds a complete response frame (length-prefixed) ready to `write`
/// to a connection fd.
pub fn build_response_frame(cmd_number: u8, status: u64, payload: &[u8]) -> SidResult<Buffer> {
    let mut buffer = Buffer::create(
        BufferSpec::new(Backend::Heap, Shape::Linear, Mode::SizePrefix),
        BufferInit::new(PREFIX_LEN + HEADER_LEN + payload.len(), 64, 0),
    )?;
    let mut header_bytes = Vec::with_capacity(HEADER_LEN);
    FrameHeader { protocol: UBRIDGE_PROTOCOL, cmd_number, status }.encode(&mut header_bytes);
    buffer.add(&header_bytes)?;
    if !payload.is_empty() {
        buffer.add(payload)?;
    }
    Ok(buffer)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
