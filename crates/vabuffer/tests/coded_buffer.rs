// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Coded Buffer Tests
//
// TESTING LAYERS:
//
// Layer 1 (Software driver - No hardware required):
//   - test_two_segment_scenario: size, full copy and short copies of a
//     1000 + 500 byte output
//   - test_random_outputs: linearization against randomly segmented data
//   - test_lifecycle_balance: every create is matched by exactly one destroy
//   - test_buffers_across_threads: concurrent buffers on one display
//
// RUN:
//   cargo test --test coded_buffer

use rand::Rng;
use std::{sync::Arc, thread};
use vabuffer::{
    coded_buffer::CodedBuffer,
    context::Context,
    display::Display,
    driver::{Entrypoint, Profile},
    mock::MockDriver,
    Error,
};

fn setup() -> (Arc<MockDriver>, Display) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mock = Arc::new(MockDriver::new());
    let display = Display::new(Arc::clone(&mock));
    (mock, display)
}

fn h264_context(display: &Display) -> Context {
    Context::new(display, Profile::H264Main, Entrypoint::EncSlice, 1920, 1080)
        .expect("mock context")
}

#[test]
fn test_two_segment_scenario() {
    let (mock, display) = setup();
    let context = h264_context(&display);
    let mut coded = CodedBuffer::new(&context, 4096).unwrap();

    let first = vec![0x11u8; 1000];
    let second = vec![0x22u8; 500];
    mock.set_output(coded.id(), vec![first.clone(), second.clone()])
        .unwrap();

    assert_eq!(coded.size().unwrap(), 1500);

    let mut dest = vec![0u8; 2000];
    assert_eq!(coded.copy_into(&mut dest).unwrap(), 1500);
    assert_eq!(&dest[..1000], &first[..]);
    assert_eq!(&dest[1000..1500], &second[..]);
    assert!(dest[1500..].iter().all(|&b| b == 0));

    // The first segment alone does not fit
    let mut dest = vec![0u8; 800];
    match coded.copy_into(&mut dest) {
        Err(Error::PartialCopy { copied, required }) => {
            assert_eq!(copied, 0);
            assert_eq!(required, 1500);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(dest.iter().all(|&b| b == 0));

    // Only the first segment fits
    let mut dest = vec![0u8; 1200];
    match coded.copy_into(&mut dest) {
        Err(Error::PartialCopy { copied, .. }) => assert_eq!(copied, 1000),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(&dest[..1000], &first[..]);
    assert!(dest[1000..].iter().all(|&b| b == 0));

    assert!(!coded.is_mapped());
    assert_eq!(mock.mapped_buffers(), 0);
}

#[test]
fn test_random_outputs() {
    let (mock, display) = setup();
    let context = h264_context(&display);
    let mut rng = rand::rng();

    for _ in 0..32 {
        let segments = rng.random_range(0..6);
        let payloads: Vec<Vec<u8>> = (0..segments)
            .map(|_| {
                let mut payload = vec![0u8; rng.random_range(0..512)];
                rng.fill(&mut payload[..]);
                payload
            })
            .collect();
        let expected = payloads.concat();

        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), payloads.clone()).unwrap();

        assert_eq!(coded.size().unwrap(), expected.len());
        assert_eq!(coded.read_to_vec().unwrap(), expected);

        // A destination one byte short fails, keeping whole segments only
        if !expected.is_empty() {
            let mut dest = vec![0u8; expected.len() - 1];
            match coded.copy_into(&mut dest) {
                Err(Error::PartialCopy { copied, required }) => {
                    assert_eq!(required, expected.len());
                    let whole: usize = payloads
                        .iter()
                        .map(Vec::len)
                        .scan(0, |acc, len| {
                            *acc += len;
                            Some(*acc)
                        })
                        .take_while(|&end| end < expected.len())
                        .last()
                        .unwrap_or(0);
                    assert_eq!(copied, whole);
                    assert_eq!(&dest[..copied], &expected[..copied]);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }
    assert_eq!(mock.live_buffers(), 0);
}

#[test]
fn test_lifecycle_balance() {
    let (mock, display) = setup();
    {
        let context = h264_context(&display);
        let mut buffers: Vec<CodedBuffer> = (0..8)
            .map(|_| CodedBuffer::new(&context, 1024).unwrap())
            .collect();
        assert_eq!(mock.live_buffers(), 8);

        // Destroy half explicitly, drop the rest
        for coded in buffers.iter_mut().step_by(2) {
            coded.map().unwrap();
            coded.destroy().unwrap();
        }
        assert_eq!(mock.live_buffers(), 4);
    }

    let calls = mock.calls();
    assert_eq!(calls.create_buffer, 8);
    assert_eq!(calls.destroy_buffer, 8);
    assert_eq!(calls.map_buffer, calls.unmap_buffer);
    assert_eq!(mock.live_buffers(), 0);
    assert_eq!(mock.live_contexts(), 0);
    assert_eq!(mock.live_configs(), 0);
}

#[test]
fn test_buffers_across_threads() {
    let (mock, display) = setup();
    mock.set_default_output(vec![vec![0xC0; 300], vec![0xDE; 200]]);
    let context = h264_context(&display);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let mut coded = CodedBuffer::new(&context, 1024).unwrap();
                    assert_eq!(coded.size().unwrap(), 500);
                    let mut dest = [0u8; 500];
                    assert_eq!(coded.copy_into(&mut dest).unwrap(), 500);
                    assert_eq!(dest[299], 0xC0);
                    assert_eq!(dest[300], 0xDE);
                }
            });
        }
    });

    let calls = mock.calls();
    assert_eq!(calls.create_buffer, 200);
    assert_eq!(calls.destroy_buffer, 200);
    assert_eq!(calls.map_buffer, 400);
    assert_eq!(calls.unmap_buffer, 400);
    assert_eq!(mock.live_buffers(), 0);
}

#[test]
fn test_buffer_moves_between_threads() {
    let (mock, display) = setup();
    let context = h264_context(&display);
    let coded = CodedBuffer::new(&context, 64).unwrap();
    mock.set_output(coded.id(), vec![b"moved".to_vec()]).unwrap();

    thread::scope(|scope| {
        let handle = scope.spawn(move || {
            let mut coded = coded;
            coded.read_to_vec().unwrap()
        });
        assert_eq!(handle.join().unwrap(), b"moved");
    });
    assert_eq!(mock.live_buffers(), 0);
}
