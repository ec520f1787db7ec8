// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{Backend, BufferInit, BufferSpec, Mode, Shape};
use std::io::Write as _;
use std::os::fd::AsRawFd;

fn spec(backend: Backend, shape: Shape, mode: Mode) -> BufferSpec {
    BufferSpec::new(backend, shape, mode)
}

#[test]
fn linear_plain_add_and_data() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::Plain),
        BufferInit::new(16, 16, 0),
    )
    .unwrap();
    buf.add(b"hello").unwrap();
    buf.add(b" world").unwrap();
    assert_eq!(buf.data(), b"hello world");
    assert!(buf.is_complete(), "plain mode is always complete");
}

#[test]
fn size_prefix_reserves_and_updates_header() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::SizePrefix),
        BufferInit::new(64, 16, 0),
    )
    .unwrap();
    buf.add(b"abc").unwrap();
    let data = buf.data();
    assert_eq!(data.len(), SIZE_PREFIX_LEN + 3);
    let prefix = u32::from_be_bytes(data[0..4].try_into().unwrap());
    assert_eq!(prefix as usize, data.len());
    assert_eq!(&data[4..], b"abc");

    buf.add(b"def").unwrap();
    let data = buf.data();
    let prefix = u32::from_be_bytes(data[0..4].try_into().unwrap());
    assert_eq!(prefix as usize, data.len());
}

#[test]
fn is_complete_invariant() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::SizePrefix),
        BufferInit::new(64, 16, 0),
    )
    .unwrap();
    // Simulate a reader buffer: raw bytes arrive with a genuine 4-byte
    // prefix at offset 0, not through `add()`.
    let frame = {
        let mut v = vec![0u8; 4];
        v.extend_from_slice(b"payload");
        let len = v.len() as u32;
        v[..4].copy_from_slice(&len.to_be_bytes());
        v
    };

    let (r, w) = nix::unistd::pipe().unwrap();
    let mut w = std::fs::File::from(w);
    w.write_all(&frame[..6]).unwrap();
    buf.read(r.as_raw_fd()).unwrap();
    assert!(!buf.is_complete());

    w.write_all(&frame[6..]).unwrap();
    buf.read(r.as_raw_fd()).unwrap();
    assert!(buf.is_complete());
}

#[test]
fn reset_truncates_and_unreserves() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::SizePrefix),
        BufferInit::new(64, 16, 0),
    )
    .unwrap();
    buf.add(b"xyz").unwrap();
    assert!(!buf.data().is_empty());
    buf.reset(0);
    assert!(buf.data().is_empty());
    buf.add(b"fresh").unwrap();
    assert_eq!(&buf.data()[4..], b"fresh");
}

#[test]
fn growth_fails_past_limit() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::Plain),
        BufferInit::new(0, 16, 64),
    )
    .unwrap();
    let chunk = vec![0u8; 65];
    let err = buf.add(&chunk).unwrap_err();
    assert!(matches!(err, SidError::ResourceExhausted(_)));
    assert!(buf.stat().used <= 64);
}

#[test]
fn growth_rounds_up_to_alloc_step() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::Plain),
        BufferInit::new(0, 16, 0),
    )
    .unwrap();
    buf.add(&vec![0u8; 20]).unwrap();
    assert_eq!(buf.stat().allocated, 32);
}

#[test]
fn write_linear_round_trips_through_a_pipe() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::Plain),
        BufferInit::new(16, 16, 0),
    )
    .unwrap();
    buf.add(b"ping").unwrap();

    let (r, w) = nix::unistd::pipe().unwrap();
    let n = buf.write(w.as_raw_fd()).unwrap();
    assert_eq!(n, 4);
    drop(w);

    let mut out = [0u8; 4];
    nix::unistd::read(r.as_raw_fd(), &mut out).unwrap();
    assert_eq!(&out, b"ping");
}

#[test]
fn write_vector_writes_every_segment_via_writev() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Vector, Mode::Plain),
        BufferInit::new(64, 16, 0),
    )
    .unwrap();
    buf.add(b"foo").unwrap();
    buf.add(b"bar").unwrap();

    let (r, w) = nix::unistd::pipe().unwrap();
    let n = buf.write(w.as_raw_fd()).unwrap();
    assert_eq!(n, 6);
    drop(w);

    let mut out = [0u8; 6];
    nix::unistd::read(r.as_raw_fd(), &mut out).unwrap();
    assert_eq!(&out, b"foobar");
}

#[test]
fn fmt_write_appends_formatted_text() {
    let mut buf = Buffer::create(
        spec(Backend::Heap, Shape::Linear, Mode::Plain),
        BufferInit::new(16, 16, 0),
    )
    .unwrap();
    write!(buf, "{}-{}", "a", 1).unwrap();
    assert_eq!(buf.data(), b"a-1");
}

#[test]
fn memfd_backend_round_trips() {
    let mut buf = Buffer::create(
        spec(Backend::Memfd, Shape::Linear, Mode::Plain),
        BufferInit::new(16, 16, 0),
    )
    .unwrap();
    buf.add(b"zero-copy").unwrap();
    assert_eq!(buf.data(), b"zero-copy");
    assert!(buf.fd().is_some());
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn is_complete_matches_invariant(payload in proptest::collection::vec(any::<u8>(), 0..40)) {
            let mut buf = Buffer::create(
                spec(Backend::Heap, Shape::Linear, Mode::SizePrefix),
                BufferInit::new(128, 16, 0),
            ).unwrap();
            let mut frame = vec![0u8; 4];
            frame.extend_from_slice(&payload);
            let total = frame.len() as u32;
            frame[..4].copy_from_slice(&total.to_be_bytes());

            let (r, w) = nix::unistd::pipe().unwrap();
            let mut w = std::fs::File::from(w);
            w.write_all(&frame).unwrap();
            drop(w);
            loop {
                match buf.read(r.as_raw_fd()) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            let used = buf.stat().used;
            let prefix = if used >= 4 {
                u32::from_be_bytes(buf.data()[0..4].try_into().unwrap()) as usize
            } else {
                usize::MAX
            };
            prop_assert_eq!(buf.is_complete(), used >= 4 && used >= prefix);
        }
    }
}
