// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Walking and linearizing the segments of a mapped coded buffer.
//!
//! When a coded buffer is mapped the driver hands back a singly linked chain
//! of `VACodedBufferSegment`s living in its own memory. [`SegmentList`] walks
//! that chain once and keeps a descriptor per segment; the bytes themselves
//! stay in driver memory and are only borrowed for as long as the mapping
//! session lasts.

use crate::{driver::SegmentHead, fill::Fill, Error};
use std::{fmt, slice};
use vabuffer_sys as ffi;

/// One contiguous chunk of coded data inside driver memory.
///
/// Segments are only reachable by reference through a [`SegmentList`], which
/// itself only lives while its buffer is mapped.
pub struct Segment {
    data: *const u8,
    size: usize,
    bit_offset: u32,
    status: u32,
}

impl Segment {
    /// The bytes of this segment.
    pub fn as_bytes(&self) -> &[u8] {
        if self.size == 0 {
            return &[];
        }
        // SAFETY: `data` was checked non-null when the list was built and the
        // driver keeps `size` bytes valid until the buffer is unmapped, which
        // cannot happen while this borrow is alive.
        unsafe { slice::from_raw_parts(self.data, self.size) }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Bit offset of the first valid bit in the segment.
    pub fn bit_offset(&self) -> u32 {
        self.bit_offset
    }

    /// Raw `VA_CODED_BUF_STATUS_*` flags reported by the driver.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// Average quantizer of the encoded picture, when the driver reports it.
    pub fn average_qp(&self) -> u8 {
        (self.status & ffi::VA_CODED_BUF_STATUS_PICTURE_AVE_QP_MASK) as u8
    }

    /// True if a slice overflowed the requested slice size.
    pub fn slice_overflow(&self) -> bool {
        self.status & ffi::VA_CODED_BUF_STATUS_SLICE_OVERFLOW_MASK != 0
    }

    /// True if the picture exceeded the maximum frame size.
    pub fn frame_size_overflow(&self) -> bool {
        self.status & ffi::VA_CODED_BUF_STATUS_FRAME_SIZE_OVERFLOW != 0
    }

    /// True if the segment holds exactly one NAL unit.
    pub fn single_nalu(&self) -> bool {
        self.status & ffi::VA_CODED_BUF_STATUS_SINGLE_NALU != 0
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("size", &self.size)
            .field("bit_offset", &self.bit_offset)
            .field("status", &format_args!("{:#x}", self.status))
            .finish()
    }
}

/// The segments of a mapped coded buffer, in driver order.
pub struct SegmentList {
    segments: Vec<Segment>,
}

// SAFETY: the list only reads driver memory that stays mapped for its whole
// lifetime; nothing in it is tied to the thread that mapped it.
unsafe impl Send for SegmentList {}
unsafe impl Sync for SegmentList {}

impl SegmentList {
    /// Walks the chain starting at `head`.
    ///
    /// # Safety
    ///
    /// `head` must come from [`crate::driver::Driver::map_buffer`] and the
    /// buffer must stay mapped for as long as the returned list is alive.
    pub(crate) unsafe fn from_chain(head: SegmentHead) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut cursor = head;

        while let Some(node) = cursor {
            // SAFETY: the driver contract guarantees every link is valid and
            // the chain is null-terminated.
            let raw = unsafe { node.as_ref() };
            let size = raw.size as usize;
            if raw.buf.is_null() && size != 0 {
                log::warn!(
                    "segment {} declares {} bytes without data",
                    segments.len(),
                    size
                );
                return Err(Error::NullPointer);
            }
            segments.push(Segment {
                data: raw.buf as *const u8,
                size,
                bit_offset: raw.bit_offset,
                status: raw.status,
            });
            cursor = std::ptr::NonNull::new(raw.next.cast::<ffi::VACodedBufferSegment>());
        }

        Ok(SegmentList { segments })
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all segment sizes: the amount of data the encoder has produced
    /// so far, not the size the buffer was allocated with.
    pub fn total_size(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Copies every segment, in order, into `dest` starting at offset 0.
    ///
    /// The walk stops at the first segment that cannot be written in full.
    /// Such a segment is not written at all, so on failure `dest` holds
    /// exactly the fully transferred segments before it. An empty list
    /// succeeds without touching `dest`.
    ///
    /// # Returns
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialCopy`] with the number of bytes copied before
    /// the walk stopped.
    pub fn copy_into<B: Fill + ?Sized>(&self, dest: &mut B) -> Result<usize, Error> {
        let limit = dest.fill_limit();
        let mut offset = 0;

        for segment in &self.segments {
            let bytes = segment.as_bytes();
            if bytes.len() > limit.saturating_sub(offset) {
                return Err(self.short_copy(offset));
            }
            if dest.fill_at(offset, bytes) != bytes.len() {
                return Err(self.short_copy(offset));
            }
            offset += bytes.len();
        }

        Ok(offset)
    }

    fn short_copy(&self, copied: usize) -> Error {
        Error::PartialCopy {
            copied,
            required: self.total_size(),
        }
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a Segment;
    type IntoIter = slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Debug for SegmentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments.iter()).finish()
    }
}
