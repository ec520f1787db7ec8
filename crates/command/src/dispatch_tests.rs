use super::*;

use std::os::fd::AsRawFd;

use sid_resource::{Capabilities, NodeFlags, NoopHooks, ResourceType};

fn make_worker(tree: &mut Tree) -> NodeId {
    tree.create(None, ResourceType::new("worker", std::sync::Arc::new(NoopHooks), Capabilities::default()), NodeFlags::NONE, "worker", &())
        .unwrap()
}

fn version_request() -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&14u32.to_be_bytes());
    frame.push(UBRIDGE_PROTOCOL);
    frame.push(CommandNumber::Version.to_wire());
    frame.extend_from_slice(&0u64.to_be_bytes());
    frame
}

fn read_reply(socket: &std::os::unix::net::UnixDatagram) -> Vec<u8> {
    let mut buf = [0u8; 256];
    let n = socket.recv(&mut buf).unwrap();
    buf[..n].to_vec()
}

#[test]
fn version_request_gets_a_six_byte_version_reply() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let (a, b) = std::os::unix::net::UnixDatagram::pair().unwrap();

    Pipeline.execute(&mut tree, worker, a.as_raw_fd(), &version_request()).unwrap();

    let reply = read_reply(&b);
    let (header, payload) = decode_frame(&reply).unwrap();
    assert_eq!(header.cmd_number, CommandNumber::Reply.to_wire());
    assert_eq!(header.status, 0);
    assert_eq!(payload.len(), 6);
    assert_eq!(reply.len(), 20);
}

#[test]
fn unknown_command_gets_a_success_no_op_reply() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let (a, b) = std::os::unix::net::UnixDatagram::pair().unwrap();

    let mut frame = Vec::new();
    frame.extend_from_slice(&14u32.to_be_bytes());
    frame.push(UBRIDGE_PROTOCOL);
    frame.push(200); // out of the closed enumeration
    frame.extend_from_slice(&0u64.to_be_bytes());

    Pipeline.execute(&mut tree, worker, a.as_raw_fd(), &frame).unwrap();

    let reply = read_reply(&b);
    let (header, _) = decode_frame(&reply).unwrap();
    assert_eq!(header.status, 0);
}

#[test]
fn identify_with_major_and_minor_succeeds() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let (a, b) = std::os::unix::net::UnixDatagram::pair().unwrap();

    let body = b"ACTION=add\0MAJOR=8\0MINOR=0\0SEQNUM=42\0";
    let mut frame = Vec::new();
    frame.extend_from_slice(&((PREFIX_LEN + HEADER_LEN + body.len()) as u32).to_be_bytes());
    frame.push(UBRIDGE_PROTOCOL);
    frame.push(CommandNumber::Identify.to_wire());
    frame.extend_from_slice(&0u64.to_be_bytes());
    frame.extend_from_slice(body);

    Pipeline.execute(&mut tree, worker, a.as_raw_fd(), &frame).unwrap();

    let reply = read_reply(&b);
    let (header, _) = decode_frame(&reply).unwrap();
    assert_eq!(header.status, 0);
    assert!(tree.children_snapshot(worker).unwrap().is_empty(), "command node must be destroyed after dispatch");
}

#[test]
fn identify_without_major_or_minor_fails_overall() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let (a, b) = std::os::unix::net::UnixDatagram::pair().unwrap();

    let body = b"ACTION=add\0";
    let mut frame = Vec::new();
    frame.extend_from_slice(&((PREFIX_LEN + HEADER_LEN + body.len()) as u32).to_be_bytes());
    frame.push(UBRIDGE_PROTOCOL);
    frame.push(CommandNumber::Identify.to_wire());
    frame.extend_from_slice(&0u64.to_be_bytes());
    frame.extend_from_slice(body);

    Pipeline.execute(&mut tree, worker, a.as_raw_fd(), &frame).unwrap();

    let reply = read_reply(&b);
    let (header, _) = decode_frame(&reply).unwrap();
    assert_eq!(header.status, 1);
}

#[test]
fn unsupported_protocol_version_fails_overall() {
    let mut tree = Tree::new();
    let worker = make_worker(&mut tree);
    let (a, b) = std::os::unix::net::UnixDatagram::pair().unwrap();

    let mut frame = Vec::new();
    frame.extend_from_slice(&14u32.to_be_bytes());
    frame.push(UBRIDGE_PROTOCOL + 1);
    frame.push(CommandNumber::Version.to_wire());
    frame.extend_from_slice(&0u64.to_be_bytes());

    Pipeline.execute(&mut tree, worker, a.as_raw_fd(), &frame).unwrap();

    let reply = read_reply(&b);
    let (header, _) = decode_frame(&reply).unwrap();
    assert_eq!(header.status, 1);
}
