// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Software driver for exercising coded buffers without an accelerator.
//!
//! [`MockDriver`] tracks configs, contexts and buffers the way a VA driver
//! would, lets tests script the segments an encoder "produced" for each
//! buffer, and can be told to fail individual calls. Share it through an
//! [`Arc`](std::sync::Arc) to inspect it after handing it to a display:
//!
//! ```
//! use std::sync::Arc;
//! use vabuffer::display::Display;
//! use vabuffer::mock::MockDriver;
//!
//! let mock = Arc::new(MockDriver::new());
//! let display = Display::new(Arc::clone(&mock));
//! assert_eq!(mock.calls().create_buffer, 0);
//! # drop(display);
//! ```

use crate::driver::{
    BufferId, BufferType, ConfigId, ContextId, Driver, Entrypoint, Profile, SegmentHead, VaStatus,
};
use std::{
    collections::{HashMap, HashSet},
    os::raw::c_void,
    ptr::{self, NonNull},
    sync::{Mutex, MutexGuard, PoisonError},
};
use vabuffer_sys as ffi;

/// Number of calls made to each driver entry point, failed ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_config: usize,
    pub destroy_config: usize,
    pub create_context: usize,
    pub destroy_context: usize,
    pub create_buffer: usize,
    pub destroy_buffer: usize,
    pub map_buffer: usize,
    pub unmap_buffer: usize,
}

struct MockBuffer {
    size: u32,
    payloads: Vec<Vec<u8>>,
    // Segment mapped with a null data pointer
    corrupt: Option<usize>,
    chain: Option<Box<[ffi::VACodedBufferSegment]>>,
}

// SAFETY: the chain only points into `payloads` and itself, both owned by
// the buffer and only touched under the driver's state lock.
unsafe impl Send for MockBuffer {}

impl MockBuffer {
    fn map(&mut self) -> SegmentHead {
        if self.chain.is_none() {
            self.chain = Some(self.build_chain());
        }
        self.chain
            .as_mut()
            .and_then(|nodes| nodes.first_mut())
            .map(NonNull::from)
    }

    fn build_chain(&mut self) -> Box<[ffi::VACodedBufferSegment]> {
        let mut nodes: Box<[ffi::VACodedBufferSegment]> = self
            .payloads
            .iter_mut()
            .map(|payload| ffi::VACodedBufferSegment {
                size: payload.len() as u32,
                buf: payload.as_mut_ptr().cast::<c_void>(),
                ..Default::default()
            })
            .collect();

        if let Some(node) = self.corrupt.and_then(|index| nodes.get_mut(index)) {
            node.buf = ptr::null_mut();
        }

        let base = nodes.as_mut_ptr();
        for i in 1..nodes.len() {
            // SAFETY: both indices are in bounds of `nodes`
            unsafe { (*base.add(i - 1)).next = base.add(i).cast::<c_void>() };
        }
        nodes
    }
}

#[derive(Default)]
struct Failures {
    create_context: Option<VaStatus>,
    create_buffer: Option<VaStatus>,
    map_buffer: Option<VaStatus>,
    unmap_buffer: Option<VaStatus>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    calls: CallCounts,
    fail: Failures,
    configs: HashSet<ConfigId>,
    contexts: HashSet<ContextId>,
    buffers: HashMap<BufferId, MockBuffer>,
    default_output: Vec<Vec<u8>>,
}

impl State {
    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory implementation of [`Driver`].
///
/// IDs are handed out from a single counter starting at `0x10`, so no two
/// objects ever share an ID and `VA_INVALID_ID` is never produced.
pub struct MockDriver {
    state: Mutex<State>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver {
            state: Mutex::new(State {
                next_id: 0x10,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the segments that mapping `buffer` will return, one payload per
    /// segment. An empty list maps to an empty chain.
    ///
    /// Returns `SURFACE_BUSY` while the buffer is mapped, `INVALID_BUFFER`
    /// for an unknown buffer and `NOT_ENOUGH_BUFFER` if the payloads exceed
    /// the allocated size.
    pub fn set_output(&self, buffer: BufferId, payloads: Vec<Vec<u8>>) -> Result<(), VaStatus> {
        let mut state = self.state();
        let buf = state
            .buffers
            .get_mut(&buffer)
            .ok_or(VaStatus::INVALID_BUFFER)?;
        if buf.chain.is_some() {
            return Err(VaStatus::SURFACE_BUSY);
        }
        let total: usize = payloads.iter().map(Vec::len).sum();
        if total > buf.size as usize {
            return Err(VaStatus(ffi::VA_STATUS_ERROR_NOT_ENOUGH_BUFFER));
        }
        buf.payloads = payloads;
        buf.corrupt = None;
        Ok(())
    }

    /// Makes the segment at `index` map with a null data pointer while keeping
    /// its size, the way a misbehaving driver might. Lasts until the next
    /// `set_output`.
    ///
    /// Returns `SURFACE_BUSY` while the buffer is mapped and `INVALID_BUFFER`
    /// for an unknown buffer.
    pub fn corrupt_segment(&self, buffer: BufferId, index: usize) -> Result<(), VaStatus> {
        let mut state = self.state();
        let buf = state
            .buffers
            .get_mut(&buffer)
            .ok_or(VaStatus::INVALID_BUFFER)?;
        if buf.chain.is_some() {
            return Err(VaStatus::SURFACE_BUSY);
        }
        buf.corrupt = Some(index);
        Ok(())
    }

    /// Output given to buffers created from now on.
    pub fn set_default_output(&self, payloads: Vec<Vec<u8>>) {
        self.state().default_output = payloads;
    }

    /// Makes every following `create_context` fail with `status`, or succeed
    /// again with `None`.
    pub fn fail_create_context(&self, status: Option<VaStatus>) {
        self.state().fail.create_context = status;
    }

    pub fn fail_create_buffer(&self, status: Option<VaStatus>) {
        self.state().fail.create_buffer = status;
    }

    pub fn fail_map_buffer(&self, status: Option<VaStatus>) {
        self.state().fail.map_buffer = status;
    }

    /// A failed unmap still releases the mapping, as drivers do.
    pub fn fail_unmap_buffer(&self, status: Option<VaStatus>) {
        self.state().fail.unmap_buffer = status;
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn live_configs(&self) -> usize {
        self.state().configs.len()
    }

    pub fn live_contexts(&self) -> usize {
        self.state().contexts.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state().buffers.len()
    }

    pub fn mapped_buffers(&self) -> usize {
        self.state()
            .buffers
            .values()
            .filter(|buf| buf.chain.is_some())
            .count()
    }

    pub fn is_mapped(&self, buffer: BufferId) -> bool {
        self.state()
            .buffers
            .get(&buffer)
            .is_some_and(|buf| buf.chain.is_some())
    }

    /// Allocated size of `buffer`, `None` if it does not exist.
    pub fn buffer_size(&self, buffer: BufferId) -> Option<usize> {
        self.state()
            .buffers
            .get(&buffer)
            .map(|buf| buf.size as usize)
    }
}

// SAFETY: chains live in `MockBuffer::chain` and are only dropped by
// unmap_buffer or destroy_buffer; set_output and corrupt_segment refuse
// mapped buffers. A corrupted segment carries a null `buf`, never a
// dangling one.
unsafe impl Driver for MockDriver {
    fn create_config(
        &self,
        _profile: Profile,
        _entrypoint: Entrypoint,
    ) -> Result<ConfigId, VaStatus> {
        let mut state = self.state();
        state.calls.create_config += 1;
        let id = state.allocate_id();
        state.configs.insert(id);
        Ok(id)
    }

    fn destroy_config(&self, config: ConfigId) -> Result<(), VaStatus> {
        let mut state = self.state();
        state.calls.destroy_config += 1;
        if state.configs.remove(&config) {
            Ok(())
        } else {
            Err(VaStatus::INVALID_CONFIG)
        }
    }

    fn create_context(
        &self,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<ContextId, VaStatus> {
        let mut state = self.state();
        state.calls.create_context += 1;
        if let Some(status) = state.fail.create_context {
            return Err(status);
        }
        if !state.configs.contains(&config) {
            return Err(VaStatus::INVALID_CONFIG);
        }
        if width == 0 || height == 0 {
            return Err(VaStatus::RESOLUTION_NOT_SUPPORTED);
        }
        let id = state.allocate_id();
        state.contexts.insert(id);
        Ok(id)
    }

    fn destroy_context(&self, context: ContextId) -> Result<(), VaStatus> {
        let mut state = self.state();
        state.calls.destroy_context += 1;
        if state.contexts.remove(&context) {
            Ok(())
        } else {
            Err(VaStatus::INVALID_CONTEXT)
        }
    }

    fn create_buffer(
        &self,
        context: ContextId,
        buffer_type: BufferType,
        size: u32,
    ) -> Result<BufferId, VaStatus> {
        let mut state = self.state();
        state.calls.create_buffer += 1;
        if let Some(status) = state.fail.create_buffer {
            return Err(status);
        }
        if !state.contexts.contains(&context) {
            return Err(VaStatus::INVALID_CONTEXT);
        }
        if buffer_type != ffi::VAEncCodedBufferType {
            return Err(VaStatus::UNSUPPORTED_BUFFERTYPE);
        }
        if size == 0 {
            return Err(VaStatus::INVALID_PARAMETER);
        }

        let id = state.allocate_id();
        let payloads = state.default_output.clone();
        state.buffers.insert(
            id,
            MockBuffer {
                size,
                payloads,
                corrupt: None,
                chain: None,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        let mut state = self.state();
        state.calls.destroy_buffer += 1;
        state
            .buffers
            .remove(&buffer)
            .map(drop)
            .ok_or(VaStatus::INVALID_BUFFER)
    }

    fn map_buffer(&self, buffer: BufferId) -> Result<SegmentHead, VaStatus> {
        let mut state = self.state();
        state.calls.map_buffer += 1;
        if let Some(status) = state.fail.map_buffer {
            return Err(status);
        }
        let buf = state
            .buffers
            .get_mut(&buffer)
            .ok_or(VaStatus::INVALID_BUFFER)?;
        Ok(buf.map())
    }

    fn unmap_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        let mut state = self.state();
        state.calls.unmap_buffer += 1;
        let failure = state.fail.unmap_buffer;
        let buf = state
            .buffers
            .get_mut(&buffer)
            .ok_or(VaStatus::INVALID_BUFFER)?;
        if buf.chain.take().is_none() {
            return Err(VaStatus::OPERATION_FAILED);
        }
        match failure {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(mock: &MockDriver) -> BufferId {
        let config = mock
            .create_config(Profile::H264Main, Entrypoint::EncSlice)
            .unwrap();
        let context = mock.create_context(config, 64, 64).unwrap();
        mock.create_buffer(context, ffi::VAEncCodedBufferType, 1024)
            .unwrap()
    }

    fn walk(head: SegmentHead) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut cursor = head;
        while let Some(node) = cursor {
            let seg = unsafe { node.as_ref() };
            let bytes = unsafe { std::slice::from_raw_parts(seg.buf as *const u8, seg.size as usize) };
            out.push(bytes.to_vec());
            cursor = NonNull::new(seg.next.cast());
        }
        out
    }

    #[test]
    fn test_ids_are_unique() {
        let mock = MockDriver::new();
        let a = mock
            .create_config(Profile::H264Main, Entrypoint::EncSlice)
            .unwrap();
        let b = mock.create_context(a, 16, 16).unwrap();
        assert_ne!(a, b);
        assert!(a >= 0x10);
    }

    #[test]
    fn test_map_returns_scripted_chain() {
        let mock = MockDriver::new();
        let id = buffer(&mock);
        mock.set_output(id, vec![vec![1, 2], vec![3]]).unwrap();

        let head = mock.map_buffer(id).unwrap();
        assert_eq!(walk(head), vec![vec![1, 2], vec![3]]);
        assert!(mock.is_mapped(id));

        // Mapping again hands back the same chain
        assert_eq!(mock.map_buffer(id).unwrap(), head);
        mock.unmap_buffer(id).unwrap();
        assert!(!mock.is_mapped(id));
    }

    #[test]
    fn test_empty_output_maps_to_empty_chain() {
        let mock = MockDriver::new();
        let id = buffer(&mock);
        assert_eq!(mock.map_buffer(id).unwrap(), None);
    }

    #[test]
    fn test_set_output_rules() {
        let mock = MockDriver::new();
        let id = buffer(&mock);

        assert_eq!(
            mock.set_output(id, vec![vec![0; 2048]]),
            Err(VaStatus(ffi::VA_STATUS_ERROR_NOT_ENOUGH_BUFFER))
        );
        assert_eq!(
            mock.set_output(0xdead, vec![]),
            Err(VaStatus::INVALID_BUFFER)
        );
        mock.map_buffer(id).unwrap();
        assert_eq!(mock.set_output(id, vec![]), Err(VaStatus::SURFACE_BUSY));
    }

    #[test]
    fn test_corrupt_segment() {
        let mock = MockDriver::new();
        let id = buffer(&mock);
        mock.set_output(id, vec![vec![1; 4], vec![2; 6]]).unwrap();
        mock.corrupt_segment(id, 1).unwrap();

        let head = mock.map_buffer(id).unwrap().unwrap();
        let first = unsafe { head.as_ref() };
        assert!(!first.buf.is_null());
        let second = unsafe { &*first.next.cast::<ffi::VACodedBufferSegment>() };
        assert!(second.buf.is_null());
        assert_eq!(second.size, 6);

        assert_eq!(mock.corrupt_segment(id, 0), Err(VaStatus::SURFACE_BUSY));
        assert_eq!(
            mock.corrupt_segment(0xdead, 0),
            Err(VaStatus::INVALID_BUFFER)
        );

        // New output clears the corruption
        mock.unmap_buffer(id).unwrap();
        mock.set_output(id, vec![vec![3; 2]]).unwrap();
        let head = mock.map_buffer(id).unwrap();
        assert_eq!(walk(head), vec![vec![3; 2]]);
    }

    #[test]
    fn test_default_output() {
        let mock = MockDriver::new();
        mock.set_default_output(vec![vec![7; 3]]);
        let id = buffer(&mock);
        let head = mock.map_buffer(id).unwrap();
        assert_eq!(walk(head), vec![vec![7; 3]]);
    }

    #[test]
    fn test_wrong_buffer_type() {
        let mock = MockDriver::new();
        let config = mock
            .create_config(Profile::HevcMain, Entrypoint::EncSlice)
            .unwrap();
        let context = mock.create_context(config, 64, 64).unwrap();
        assert_eq!(
            mock.create_buffer(context, 0, 1024),
            Err(VaStatus::UNSUPPORTED_BUFFERTYPE)
        );
    }

    #[test]
    fn test_failures_are_counted() {
        let mock = MockDriver::new();
        let id = buffer(&mock);
        mock.fail_map_buffer(Some(VaStatus::OPERATION_FAILED));
        assert_eq!(mock.map_buffer(id), Err(VaStatus::OPERATION_FAILED));
        assert_eq!(mock.calls().map_buffer, 1);
        assert!(!mock.is_mapped(id));
    }

    #[test]
    fn test_destroy_releases_mapping() {
        let mock = MockDriver::new();
        let id = buffer(&mock);
        mock.map_buffer(id).unwrap();
        mock.destroy_buffer(id).unwrap();
        assert_eq!(mock.live_buffers(), 0);
        assert_eq!(mock.mapped_buffers(), 0);
        assert_eq!(mock.destroy_buffer(id), Err(VaStatus::INVALID_BUFFER));
    }
}
