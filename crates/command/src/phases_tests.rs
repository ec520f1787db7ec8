use super::*;

use sid_resource::{Capabilities, NodeFlags, NoopHooks, ResourceType};
use std::sync::Arc;

use crate::payload::DeviceRecord;
use crate::resource::create_command;
use crate::wire::FrameHeader;

fn make_worker(tree: &mut Tree) -> NodeId {
    tree.create(None, ResourceType::new("worker", Arc::new(NoopHooks), Capabilities::default()), NodeFlags::NONE, "worker", &())
        .unwrap()
}

fn header() -> FrameHeader {
    FrameHeader { protocol: 1, cmd_number: CommandNumber::Identify.to_wire(), status: 0 }
}

#[test]
fn runs_every_phase_in_order_when_the_device_is_fully_identified() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let device = DeviceRecord { major: Some(8), minor: Some(0), ..Default::default() };
    let command = create_command(&mut tree, worker, header(), CommandNumber::Identify, Some(device)).unwrap();

    let outcome = run_identify(&mut tree, command).unwrap();
    assert_eq!(outcome, Ok(()));
}

#[test]
fn short_circuits_at_scan_core_current_when_major_or_minor_is_missing() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let device = DeviceRecord { major: Some(8), minor: None, ..Default::default() };
    let command = create_command(&mut tree, worker, header(), CommandNumber::Identify, Some(device)).unwrap();

    let outcome = run_identify(&mut tree, command).unwrap();
    assert_eq!(outcome, Err(("scan_core_current", -1)));
}

#[test]
fn short_circuits_when_no_device_record_was_decoded() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let command = create_command(&mut tree, worker, header(), CommandNumber::Identify, None).unwrap();

    let outcome = run_identify(&mut tree, command).unwrap();
    assert_eq!(outcome, Err(("scan_core_current", -1)));
}
