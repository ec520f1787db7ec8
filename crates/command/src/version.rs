// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `version` command's reply payload: `{major, minor, release}`, each
//! a little-endian `u16`, taken from this crate's own Cargo version.

/// Encodes the running daemon's protocol version as 6 bytes.
pub fn encode_version_payload() -> [u8; 6] {
    let major: u16 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0);
    let minor: u16 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    let release: u16 = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0);
    let mut out = [0u8; 6];
    out[0..2].copy_from_slice(&major.to_le_bytes());
    out[2..4].copy_from_slice(&minor.to_le_bytes());
    out[4..6].copy_from_slice(&release.to_le_bytes());
    out
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
