// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Encoder output buffers.
//!
//! A [`CodedBuffer`] owns one `VAEncCodedBufferType` buffer allocated in an
//! encoding [`Context`]. The encoder writes compressed pictures into it; the
//! data is read back by mapping the buffer, which exposes it as a list of
//! segments, and is linearized into caller-provided memory.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vabuffer::coded_buffer::CodedBuffer;
//! use vabuffer::context::Context;
//! use vabuffer::display::Display;
//! use vabuffer::driver::{Entrypoint, Profile};
//! use vabuffer::mock::MockDriver;
//!
//! let mock = Arc::new(MockDriver::new());
//! let display = Display::new(Arc::clone(&mock));
//! let context = Context::new(&display, Profile::H264Main, Entrypoint::EncSlice, 640, 480)?;
//! let mut coded = CodedBuffer::new(&context, 4096)?;
//!
//! // Pretend the encoder produced two segments
//! mock.set_output(coded.id(), vec![vec![0xAA; 1000], vec![0xBB; 500]])
//!     .expect("buffer is live and unmapped");
//!
//! assert_eq!(coded.size()?, 1500);
//! let mut dest = vec![0u8; 2000];
//! assert_eq!(coded.copy_into(&mut dest)?, 1500);
//! assert!(!coded.is_mapped());
//! # Ok::<(), vabuffer::Error>(())
//! ```

use crate::{
    context::Context,
    display::Display,
    driver::{BufferId, VaStatus},
    fill::Fill,
    segment::SegmentList,
    Error,
};
use std::fmt;
use vabuffer_sys as ffi;

/// Hardware output buffer of a video encoder.
///
/// The buffer borrows its parent [`Context`] and reaches the device through
/// the context's [`Display`]. Every driver call is made while holding the
/// display lock and only for the duration of that call.
///
/// State transitions take `&mut self`, so a buffer has a single logical owner
/// at a time. It can be moved to another thread between operations.
pub struct CodedBuffer<'ctx> {
    context: &'ctx Context,
    id: BufferId,
    segments: Option<SegmentList>,
}

impl<'ctx> CodedBuffer<'ctx> {
    /// Allocates a coded buffer of `size` bytes in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] without calling the driver if `size`
    /// is zero or does not fit the driver's 32-bit size, and
    /// [`Error::Allocation`] if the driver rejects the request.
    pub fn new(context: &'ctx Context, size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::InvalidArgument("coded buffer size must be non-zero"));
        }
        let size = u32::try_from(size)
            .map_err(|_| Error::InvalidArgument("coded buffer size exceeds u32::MAX"))?;

        let created =
            context
                .display()
                .lock()
                .create_buffer(context.id(), ffi::VAEncCodedBufferType, size);
        let id = created.map_err(Error::Allocation)?;

        log::debug!("coded buffer {:#010x} ({} bytes)", id, size);
        Ok(CodedBuffer {
            context,
            id,
            segments: None,
        })
    }

    /// The VA buffer ID, to be referenced from picture parameters. Returns
    /// `VA_INVALID_ID` once the buffer has been destroyed.
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn context(&self) -> &'ctx Context {
        self.context
    }

    /// True until [`CodedBuffer::destroy`] has run.
    pub fn is_valid(&self) -> bool {
        self.id != ffi::VA_INVALID_ID
    }

    /// True while a mapping session is active.
    pub fn is_mapped(&self) -> bool {
        self.segments.is_some()
    }

    /// Maps the buffer and returns its segments.
    ///
    /// Mapping is idempotent: while the buffer is mapped, further calls
    /// return the same segments without calling the driver again. Release the
    /// mapping with [`CodedBuffer::unmap`] once done reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if the driver cannot map the buffer (or the
    /// buffer was destroyed) and [`Error::NullPointer`] if the driver returns
    /// a segment without data; no mapping is retained in either case.
    pub fn map(&mut self) -> Result<&SegmentList, Error> {
        let segments = match self.segments.take() {
            Some(segments) => segments,
            None => self.map_segments()?,
        };
        Ok(self.segments.insert(segments))
    }

    /// Releases the current mapping. Does nothing if the buffer is not
    /// mapped.
    ///
    /// The segments are dropped even if the driver reports an error.
    pub fn unmap(&mut self) -> Result<(), Error> {
        if self.segments.take().is_none() {
            return Ok(());
        }

        let result = self.display().lock().unmap_buffer(self.id);
        log::trace!("coded buffer {:#010x} unmapped", self.id);
        result.map_err(Error::Va)
    }

    /// Returns the number of bytes the encoder has written so far.
    ///
    /// This is the sum of the segment sizes, not the size the buffer was
    /// allocated with. The buffer is unmapped before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if the buffer cannot be mapped.
    pub fn size(&mut self) -> Result<usize, Error> {
        let result = self.map().map(SegmentList::total_size);
        self.finish_read();
        result
    }

    /// Copies the coded data into `dest`, segment by segment.
    ///
    /// Stops at the first segment that does not fit in full; `dest` then holds
    /// the segments copied before it. The buffer is unmapped before
    /// returning, whatever the outcome.
    ///
    /// # Returns
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if the buffer cannot be mapped and
    /// [`Error::PartialCopy`] if `dest` is too small.
    pub fn copy_into<B: Fill + ?Sized>(&mut self, dest: &mut B) -> Result<usize, Error> {
        let result = self.map().and_then(|segments| segments.copy_into(dest));
        self.finish_read();
        result
    }

    /// Reads the coded data into a new vector sized to fit, in a single
    /// mapping session.
    pub fn read_to_vec(&mut self) -> Result<Vec<u8>, Error> {
        let result = self.map().and_then(|segments| {
            let mut data = vec![0u8; segments.total_size()];
            segments.copy_into(&mut data)?;
            Ok(data)
        });
        self.finish_read();
        result
    }

    /// Releases the hardware buffer.
    ///
    /// An active mapping is released first. Calling `destroy` again, or
    /// dropping the buffer afterwards, does nothing. The ID is reset to
    /// `VA_INVALID_ID` even if the driver reports an error.
    pub fn destroy(&mut self) -> Result<(), Error> {
        if !self.is_valid() {
            return Ok(());
        }

        log::debug!("coded buffer {:#010x} destroyed", self.id);
        let unmapped = self.unmap();
        let released = self.display().lock().destroy_buffer(self.id);
        self.id = ffi::VA_INVALID_ID;

        unmapped.and(released.map_err(Error::Va))
    }

    fn display(&self) -> &'ctx Display {
        self.context.display()
    }

    fn map_segments(&self) -> Result<SegmentList, Error> {
        if !self.is_valid() {
            return Err(Error::Mapping(VaStatus::INVALID_BUFFER));
        }

        let head = self
            .display()
            .lock()
            .map_buffer(self.id)
            .map_err(Error::Mapping)?;
        log::trace!("coded buffer {:#010x} mapped", self.id);

        // SAFETY: `head` comes straight from the driver and the list is
        // stored in `self.segments`, which is cleared before the driver
        // unmaps or destroys the buffer.
        match unsafe { SegmentList::from_chain(head) } {
            Ok(segments) => Ok(segments),
            Err(err) => {
                if let Err(status) = self.display().lock().unmap_buffer(self.id) {
                    log::warn!("coded buffer {:#010x}: unmap failed: {}", self.id, status);
                }
                Err(err)
            }
        }
    }

    /// Closes the mapping session of a read. Unmap errors are logged rather
    /// than masking the result of the read.
    fn finish_read(&mut self) {
        if let Err(err) = self.unmap() {
            log::warn!("coded buffer {:#010x}: {}", self.id, err);
        }
    }
}

impl fmt::Debug for CodedBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodedBuffer")
            .field("id", &format_args!("{:#010x}", self.id))
            .field("context", &format_args!("{:#010x}", self.context.id()))
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

impl Drop for CodedBuffer<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::warn!("CodedBuffer::drop() - release failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{Entrypoint, Profile},
        mock::MockDriver,
    };
    use std::sync::Arc;

    fn setup() -> (Arc<MockDriver>, Context) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mock = Arc::new(MockDriver::new());
        let display = Display::new(Arc::clone(&mock));
        let context =
            Context::new(&display, Profile::H264Main, Entrypoint::EncSlice, 1280, 720).unwrap();
        (mock, context)
    }

    #[test]
    fn test_create_and_drop() {
        let (mock, context) = setup();
        {
            let coded = CodedBuffer::new(&context, 4096).unwrap();
            assert!(coded.is_valid());
            assert!(!coded.is_mapped());
            assert_eq!(mock.buffer_size(coded.id()), Some(4096));
            assert_eq!(mock.live_buffers(), 1);
        }
        assert_eq!(mock.live_buffers(), 0);
        assert_eq!(mock.calls().destroy_buffer, 1);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 64).unwrap();

        coded.destroy().unwrap();
        assert!(!coded.is_valid());
        assert_eq!(coded.id(), ffi::VA_INVALID_ID);
        coded.destroy().unwrap();
        drop(coded);

        assert_eq!(mock.calls().destroy_buffer, 1);
        assert_eq!(mock.live_buffers(), 0);
    }

    #[test]
    fn test_zero_size_rejected() {
        let (mock, context) = setup();
        let res = CodedBuffer::new(&context, 0);
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
        assert_eq!(mock.calls().create_buffer, 0);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_rejected() {
        let (mock, context) = setup();
        let res = CodedBuffer::new(&context, u32::MAX as usize + 1);
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
        assert_eq!(mock.calls().create_buffer, 0);
    }

    #[test]
    fn test_allocation_failure() {
        let (mock, context) = setup();
        mock.fail_create_buffer(Some(VaStatus::ALLOCATION_FAILED));

        match CodedBuffer::new(&context, 4096) {
            Err(Error::Allocation(status)) => assert_eq!(status, VaStatus::ALLOCATION_FAILED),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(mock.live_buffers(), 0);
        assert_eq!(mock.calls().destroy_buffer, 0);
    }

    #[test]
    fn test_unknown_context_rejected() {
        let (mock, context) = setup();
        let stale = Context::wrap(context.display(), 0xdead);

        match CodedBuffer::new(&stale, 4096) {
            Err(Error::Allocation(status)) => assert_eq!(status, VaStatus::INVALID_CONTEXT),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(mock.live_buffers(), 0);
    }

    #[test]
    fn test_map_is_idempotent() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![1; 10], vec![2; 20]])
            .unwrap();

        let first = coded.map().unwrap().as_slice()[0].as_bytes().as_ptr();
        let second = coded.map().unwrap().as_slice()[0].as_bytes().as_ptr();
        assert_eq!(first, second);
        assert_eq!(mock.calls().map_buffer, 1);
        assert!(coded.is_mapped());

        coded.unmap().unwrap();
        assert!(!coded.is_mapped());
        assert_eq!(mock.calls().unmap_buffer, 1);
    }

    #[test]
    fn test_unmap_when_not_mapped() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        coded.unmap().unwrap();
        assert_eq!(mock.calls().unmap_buffer, 0);
    }

    #[test]
    fn test_map_failure_retains_nothing() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.fail_map_buffer(Some(VaStatus::OPERATION_FAILED));

        assert!(matches!(coded.map(), Err(Error::Mapping(_))));
        assert!(!coded.is_mapped());
        assert!(matches!(coded.size(), Err(Error::Mapping(_))));
        assert_eq!(mock.calls().unmap_buffer, 0);
    }

    #[test]
    fn test_null_segment_releases_mapping() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![1; 10]]).unwrap();
        mock.corrupt_segment(coded.id(), 0).unwrap();

        assert!(matches!(coded.size(), Err(Error::NullPointer)));
        assert!(!coded.is_mapped());
        assert_eq!(mock.calls().map_buffer, 1);
        assert_eq!(mock.calls().unmap_buffer, 1);
        assert_eq!(mock.mapped_buffers(), 0);

        let mut dest = [0u8; 16];
        assert!(matches!(
            coded.copy_into(&mut dest),
            Err(Error::NullPointer)
        ));
        assert_eq!(mock.calls().unmap_buffer, 2);
        assert_eq!(mock.mapped_buffers(), 0);
    }

    #[test]
    fn test_size_sums_segments() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![0; 100], vec![0; 23], vec![0; 7]])
            .unwrap();

        assert_eq!(coded.size().unwrap(), 130);
        assert!(!coded.is_mapped());
        assert_eq!(mock.mapped_buffers(), 0);
    }

    #[test]
    fn test_size_of_empty_buffer() {
        let (_mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        assert_eq!(coded.size().unwrap(), 0);
        assert_eq!(coded.read_to_vec().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_copy_unmaps_on_failure() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![1; 8], vec![2; 8]])
            .unwrap();

        let mut dest = [0u8; 12];
        assert!(matches!(
            coded.copy_into(&mut dest),
            Err(Error::PartialCopy {
                copied: 8,
                required: 16
            })
        ));
        assert!(!coded.is_mapped());
        assert_eq!(mock.mapped_buffers(), 0);
    }

    #[test]
    fn test_read_to_vec() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![b"abc".to_vec(), b"def".to_vec()])
            .unwrap();

        assert_eq!(coded.read_to_vec().unwrap(), b"abcdef");
        assert_eq!(mock.calls().map_buffer, 1);
        assert_eq!(mock.calls().unmap_buffer, 1);
    }

    #[test]
    fn test_destroy_unmaps_first() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![0; 4]]).unwrap();

        coded.map().unwrap();
        coded.destroy().unwrap();

        assert!(!coded.is_mapped());
        assert_eq!(mock.calls().unmap_buffer, 1);
        assert_eq!(mock.calls().destroy_buffer, 1);
        assert_eq!(mock.mapped_buffers(), 0);
    }

    #[test]
    fn test_map_after_destroy() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        coded.destroy().unwrap();

        match coded.map() {
            Err(Error::Mapping(status)) => assert_eq!(status, VaStatus::INVALID_BUFFER),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(mock.calls().map_buffer, 0);
    }

    #[test]
    fn test_unmap_failure_still_clears() {
        let (mock, context) = setup();
        let mut coded = CodedBuffer::new(&context, 4096).unwrap();
        mock.set_output(coded.id(), vec![vec![9; 3]]).unwrap();
        mock.fail_unmap_buffer(Some(VaStatus::OPERATION_FAILED));

        // The read itself succeeds; the unmap error is only logged
        assert_eq!(coded.size().unwrap(), 3);
        assert!(!coded.is_mapped());

        coded.map().unwrap();
        assert!(matches!(coded.unmap(), Err(Error::Va(_))));
        assert!(!coded.is_mapped());
    }

    #[test]
    fn test_debug_format() {
        let (_mock, context) = setup();
        let coded = CodedBuffer::new(&context, 16).unwrap();
        let debug = format!("{:?}", coded);
        assert!(debug.contains("CodedBuffer"));
        assert!(debug.contains("mapped: false"));
    }

    #[test]
    fn test_buffer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CodedBuffer<'static>>();
    }
}
