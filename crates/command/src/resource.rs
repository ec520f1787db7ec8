// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The command resource: created as a transient child of the worker for
//! the lifetime of a single request's dispatch, then destroyed once the
//! response has been written.

use std::any::Any;
use std::sync::Arc;

use sid_core::{SidError, SidResult};
use sid_resource::{Capabilities, NodeFlags, NodeId, ResourceHooks, ResourceType, Tree};

use crate::number::CommandNumber;
use crate::payload::DeviceRecord;
use crate::wire::FrameHeader;

pub struct CommandData {
    pub header: FrameHeader,
    pub number: CommandNumber,
    pub device: Option<DeviceRecord>,
}

pub struct CommandKickstart {
    header: FrameHeader,
    number: CommandNumber,
    device: Option<DeviceRecord>,
}

struct CommandHooks;

impl ResourceHooks for CommandHooks {
    fn init(&self, kickstart: &dyn Any) -> SidResult<Box<dyn Any + Send>> {
        let kickstart = kickstart
            .downcast_ref::<CommandKickstart>()
            .ok_or_else(|| SidError::Fatal("command init called with the wrong kickstart type".into()))?;
        Ok(Box::new(CommandData {
            header: kickstart.header,
            number: kickstart.number,
            device: kickstart.device.clone(),
        }))
    }
}

fn command_type() -> Arc<ResourceType> {
    ResourceType::new("command", Arc::new(CommandHooks), Capabilities::default())
}

/// Creates a `command` node as a child of `worker`, named after the
/// command number it carries (`reply`, `version`, `identify`,
/// `checkpoint`, or `unknown`).
pub fn create_command(
    tree: &mut Tree,
    worker: NodeId,
    header: FrameHeader,
    number: CommandNumber,
    device: Option<DeviceRecord>,
) -> SidResult<NodeId> {
    let identifier = match number {
        CommandNumber::Reply => "reply",
        CommandNumber::Version => "version",
        CommandNumber::Identify => "identify",
        CommandNumber::Checkpoint => "checkpoint",
        CommandNumber::Unknown => "unknown",
    };
    tree.create(Some(worker), command_type(), NodeFlags::NONE, identifier, &CommandKickstart { header, number, device })
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
