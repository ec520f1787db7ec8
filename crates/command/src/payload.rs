// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoding the `identify` command's payload: a concatenation of
//! NUL-terminated `KEY=VALUE` strings.

use sid_core::{SidError, SidResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove,
    Change,
    Move,
    Online,
    Offline,
    Bind,
    Unbind,
}

impl Action {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Action::Add),
            "remove" => Some(Action::Remove),
            "change" => Some(Action::Change),
            "move" => Some(Action::Move),
            "online" => Some(Action::Online),
            "offline" => Some(Action::Offline),
            "bind" => Some(Action::Bind),
            "unbind" => Some(Action::Unbind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    pub action: Option<Action>,
    pub devname: Option<String>,
    pub devtype: Option<String>,
    pub major: Option<u32>,
    pub minor: Option<u32>,
    pub seqnum: Option<u64>,
    pub synth_uuid: Option<String>,
}

/// Walks `payload` as a sequence of NUL-terminated entries, advancing by
/// `strlen + 1` each time. Recognised keys (`ACTION`, `DEVNAME`,
/// `DEVTYPE`, `MAJOR`, `MINOR`, `SEQNUM`, `SYNTH_UUID`) are folded into
/// the record; unrecognised keys are ignored. An entry with no `=`, an
/// unrecognised `ACTION` value, or an unparsable integer value aborts
/// decoding.
pub fn decode_identify_payload(payload: &[u8]) -> SidResult<DeviceRecord> {
    let mut record = DeviceRecord::default();
    let mut offset = 0;
    while offset < payload.len() {
        let rest = &payload[offset..];
        let nul = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let entry = std::str::from_utf8(&rest[..nul])
            .map_err(|_| SidError::InvalidArgument("identify payload entry is not valid UTF-8".into()))?;
        offset += nul + 1;
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| SidError::InvalidArgument(format!("malformed KEY=VALUE entry: {entry:?}")))?;
        match key {
            "ACTION" => {
                record.action = Some(
                    Action::from_str(value)
                        .ok_or_else(|| SidError::InvalidArgument(format!("unrecognised ACTION value: {value:?}")))?,
                );
            }
            "DEVNAME" => record.devname = Some(value.to_string()),
            "DEVTYPE" => record.devtype = Some(value.to_string()),
            "MAJOR" => {
                record.major = Some(
                    value.parse().map_err(|_| SidError::InvalidArgument(format!("malformed MAJOR value: {value:?}")))?,
                );
            }
            "MINOR" => {
                record.minor = Some(
                    value.parse().map_err(|_| SidError::InvalidArgument(format!("malformed MINOR value: {value:?}")))?,
                );
            }
            "SEQNUM" => {
                record.seqnum = Some(
                    value.parse().map_err(|_| SidError::InvalidArgument(format!("malformed SEQNUM value: {value:?}")))?,
                );
            }
            "SYNTH_UUID" => record.synth_uuid = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(record)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
