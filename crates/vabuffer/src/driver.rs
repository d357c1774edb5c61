// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Device contract consumed by the coded buffer core.
//!
//! Everything the core needs from the accelerator is expressed by the
//! [`Driver`] trait. [`crate::va::VaDriver`] implements it on top of libva and
//! [`crate::mock::MockDriver`] implements it in software. Drivers are never
//! called directly by users of the crate: they are moved into a
//! [`crate::display::Display`], which only hands them out while its lock is
//! held.

use std::{error, fmt, ptr::NonNull, sync::Arc};
use vabuffer_sys as ffi;

/// Identifier of a VA buffer.
pub type BufferId = ffi::VABufferID;

/// Identifier of a VA encoding context.
pub type ContextId = ffi::VAContextID;

/// Identifier of a VA configuration.
pub type ConfigId = ffi::VAConfigID;

/// Kind of VA buffer to allocate (`VABufferType`).
pub type BufferType = ffi::VABufferType;

/// Head of the segment chain returned by a map call, `None` when the driver
/// produced no segments.
pub type SegmentHead = Option<NonNull<ffi::VACodedBufferSegment>>;

/// Status code returned by a VA-API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VaStatus(pub ffi::VAStatus);

impl VaStatus {
    pub const SUCCESS: VaStatus = VaStatus(ffi::VA_STATUS_SUCCESS);
    pub const OPERATION_FAILED: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_OPERATION_FAILED);
    pub const ALLOCATION_FAILED: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_ALLOCATION_FAILED);
    pub const INVALID_CONFIG: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_INVALID_CONFIG);
    pub const INVALID_CONTEXT: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_INVALID_CONTEXT);
    pub const INVALID_BUFFER: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_INVALID_BUFFER);
    pub const UNSUPPORTED_PROFILE: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_UNSUPPORTED_PROFILE);
    pub const UNSUPPORTED_ENTRYPOINT: VaStatus =
        VaStatus(ffi::VA_STATUS_ERROR_UNSUPPORTED_ENTRYPOINT);
    pub const UNSUPPORTED_BUFFERTYPE: VaStatus =
        VaStatus(ffi::VA_STATUS_ERROR_UNSUPPORTED_BUFFERTYPE);
    pub const SURFACE_BUSY: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_SURFACE_BUSY);
    pub const INVALID_PARAMETER: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_INVALID_PARAMETER);
    pub const RESOLUTION_NOT_SUPPORTED: VaStatus =
        VaStatus(ffi::VA_STATUS_ERROR_RESOLUTION_NOT_SUPPORTED);
    pub const UNKNOWN: VaStatus = VaStatus(ffi::VA_STATUS_ERROR_UNKNOWN);

    /// Converts a raw status into `Ok(())` on success.
    pub fn check(status: ffi::VAStatus) -> Result<(), VaStatus> {
        if status == ffi::VA_STATUS_SUCCESS {
            Ok(())
        } else {
            Err(VaStatus(status))
        }
    }

    pub fn code(self) -> ffi::VAStatus {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == ffi::VA_STATUS_SUCCESS
    }

    /// Human readable description, the same table as libva's `vaErrorStr`.
    /// Kept here so statuses from drivers not backed by libva (the mock)
    /// format without loading the library.
    pub fn message(self) -> &'static str {
        match self.0 {
            ffi::VA_STATUS_SUCCESS => "success (no error)",
            ffi::VA_STATUS_ERROR_OPERATION_FAILED => "operation failed",
            ffi::VA_STATUS_ERROR_ALLOCATION_FAILED => "resource allocation failed",
            ffi::VA_STATUS_ERROR_INVALID_DISPLAY => "invalid VADisplay",
            ffi::VA_STATUS_ERROR_INVALID_CONFIG => "invalid VAConfigID",
            ffi::VA_STATUS_ERROR_INVALID_CONTEXT => "invalid VAContextID",
            ffi::VA_STATUS_ERROR_INVALID_SURFACE => "invalid VASurfaceID",
            ffi::VA_STATUS_ERROR_INVALID_BUFFER => "invalid VABufferID",
            ffi::VA_STATUS_ERROR_INVALID_IMAGE => "invalid VAImageID",
            ffi::VA_STATUS_ERROR_INVALID_SUBPICTURE => "invalid VASubpictureID",
            ffi::VA_STATUS_ERROR_ATTR_NOT_SUPPORTED => "attribute not supported",
            ffi::VA_STATUS_ERROR_MAX_NUM_EXCEEDED => "list argument exceeds maximum number",
            ffi::VA_STATUS_ERROR_UNSUPPORTED_PROFILE => "the requested VAProfile is not supported",
            ffi::VA_STATUS_ERROR_UNSUPPORTED_ENTRYPOINT => {
                "the requested VAEntryPoint is not supported"
            }
            ffi::VA_STATUS_ERROR_UNSUPPORTED_RT_FORMAT => {
                "the requested RT Format is not supported"
            }
            ffi::VA_STATUS_ERROR_UNSUPPORTED_BUFFERTYPE => {
                "the requested VABufferType is not supported"
            }
            ffi::VA_STATUS_ERROR_SURFACE_BUSY => "surface is in use",
            ffi::VA_STATUS_ERROR_FLAG_NOT_SUPPORTED => "flag not supported",
            ffi::VA_STATUS_ERROR_INVALID_PARAMETER => "invalid parameter",
            ffi::VA_STATUS_ERROR_RESOLUTION_NOT_SUPPORTED => "resolution not supported",
            ffi::VA_STATUS_ERROR_UNIMPLEMENTED => "the requested function is not implemented",
            ffi::VA_STATUS_ERROR_SURFACE_IN_DISPLAYING => "surface is in displaying (may by overlay)",
            ffi::VA_STATUS_ERROR_INVALID_IMAGE_FORMAT => "invalid VAImageFormat",
            ffi::VA_STATUS_ERROR_DECODING_ERROR => "internal decoding error",
            ffi::VA_STATUS_ERROR_ENCODING_ERROR => "internal encoding error",
            ffi::VA_STATUS_ERROR_INVALID_VALUE => "an invalid/unsupported value was supplied",
            ffi::VA_STATUS_ERROR_UNSUPPORTED_FILTER => "the requested filter is not supported",
            ffi::VA_STATUS_ERROR_INVALID_FILTER_CHAIN => "an invalid filter chain was supplied",
            ffi::VA_STATUS_ERROR_HW_BUSY => "HW busy now",
            ffi::VA_STATUS_ERROR_UNSUPPORTED_MEMORY_TYPE => {
                "an unsupported memory type was supplied"
            }
            ffi::VA_STATUS_ERROR_NOT_ENOUGH_BUFFER => {
                "allocated memory size is not enough for input or output"
            }
            ffi::VA_STATUS_ERROR_TIMEDOUT => "operation timed out",
            _ => "unknown libva error",
        }
    }
}

impl fmt::Display for VaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08x})", self.message(), self.0)
    }
}

impl error::Error for VaStatus {}

/// Encoding profile of a context.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    H264ConstrainedBaseline = ffi::VAProfileH264ConstrainedBaseline,
    H264Main = ffi::VAProfileH264Main,
    H264High = ffi::VAProfileH264High,
    HevcMain = ffi::VAProfileHEVCMain,
    HevcMain10 = ffi::VAProfileHEVCMain10,
    Vp9Profile0 = ffi::VAProfileVP9Profile0,
    Av1Profile0 = ffi::VAProfileAV1Profile0,
}

impl Profile {
    /// Render-target format the encoder consumes for this profile.
    pub fn rt_format(self) -> u32 {
        match self {
            Profile::HevcMain10 => ffi::VA_RT_FORMAT_YUV420_10,
            _ => ffi::VA_RT_FORMAT_YUV420,
        }
    }
}

/// Encoding entry point of a context.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entrypoint {
    /// Slice-level encoding on the full-featured engine
    EncSlice = ffi::VAEntrypointEncSlice,
    /// Picture-level encoding (JPEG, VP8)
    EncPicture = ffi::VAEntrypointEncPicture,
    /// Slice-level encoding on the low-power engine
    EncSliceLP = ffi::VAEntrypointEncSliceLP,
}

/// Operations the coded buffer core issues to the accelerator.
///
/// Implementations are only ever called through a
/// [`crate::display::DisplayGuard`], so at most one call per device is in
/// flight at a time and implementations need not be `Sync`.
///
/// # Safety
///
/// The segment chain returned by [`Driver::map_buffer`] is dereferenced by
/// the core without further checks. Implementors must guarantee that every
/// `VACodedBufferSegment` in the chain, and every `buf` region of `size`
/// bytes it points to, stays valid and unmodified until the matching
/// [`Driver::unmap_buffer`] or [`Driver::destroy_buffer`] call, and that the
/// `next` links form a finite, null-terminated list.
pub unsafe trait Driver: Send {
    /// Creates a configuration for `profile` at `entrypoint`.
    fn create_config(&self, profile: Profile, entrypoint: Entrypoint)
        -> Result<ConfigId, VaStatus>;

    fn destroy_config(&self, config: ConfigId) -> Result<(), VaStatus>;

    /// Creates an encoding context for `width`x`height` pictures.
    fn create_context(
        &self,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<ContextId, VaStatus>;

    fn destroy_context(&self, context: ContextId) -> Result<(), VaStatus>;

    /// Allocates a buffer of `buffer_type` holding `size` bytes in `context`.
    fn create_buffer(
        &self,
        context: ContextId,
        buffer_type: BufferType,
        size: u32,
    ) -> Result<BufferId, VaStatus>;

    fn destroy_buffer(&self, buffer: BufferId) -> Result<(), VaStatus>;

    /// Maps a coded buffer and returns the head of its segment chain.
    fn map_buffer(&self, buffer: BufferId) -> Result<SegmentHead, VaStatus>;

    fn unmap_buffer(&self, buffer: BufferId) -> Result<(), VaStatus>;
}

// Lets callers keep a handle on a driver (e.g. a mock) after handing it to a
// display.
unsafe impl<D: Driver + Sync + ?Sized> Driver for Arc<D> {
    fn create_config(
        &self,
        profile: Profile,
        entrypoint: Entrypoint,
    ) -> Result<ConfigId, VaStatus> {
        (**self).create_config(profile, entrypoint)
    }

    fn destroy_config(&self, config: ConfigId) -> Result<(), VaStatus> {
        (**self).destroy_config(config)
    }

    fn create_context(
        &self,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<ContextId, VaStatus> {
        (**self).create_context(config, width, height)
    }

    fn destroy_context(&self, context: ContextId) -> Result<(), VaStatus> {
        (**self).destroy_context(context)
    }

    fn create_buffer(
        &self,
        context: ContextId,
        buffer_type: BufferType,
        size: u32,
    ) -> Result<BufferId, VaStatus> {
        (**self).create_buffer(context, buffer_type, size)
    }

    fn destroy_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        (**self).destroy_buffer(buffer)
    }

    fn map_buffer(&self, buffer: BufferId) -> Result<SegmentHead, VaStatus> {
        (**self).map_buffer(buffer)
    }

    fn unmap_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        (**self).unmap_buffer(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_check() {
        assert_eq!(VaStatus::check(ffi::VA_STATUS_SUCCESS), Ok(()));
        assert_eq!(
            VaStatus::check(ffi::VA_STATUS_ERROR_ALLOCATION_FAILED),
            Err(VaStatus::ALLOCATION_FAILED)
        );
        assert!(VaStatus::SUCCESS.is_success());
        assert!(!VaStatus::UNKNOWN.is_success());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            VaStatus::INVALID_BUFFER.to_string(),
            "invalid VABufferID (0x00000007)"
        );
        assert_eq!(VaStatus::UNKNOWN.to_string(), "unknown libva error (0xffffffff)");
        assert_eq!(VaStatus(0x7f).message(), "unknown libva error");
    }

    #[test]
    fn test_profile_values() {
        // Verify enum values match libva's VAProfile
        assert_eq!(Profile::H264ConstrainedBaseline as i32, 13);
        assert_eq!(Profile::H264Main as i32, 6);
        assert_eq!(Profile::HevcMain as i32, 17);
        assert_eq!(Profile::Av1Profile0 as i32, 32);
        assert_eq!(Entrypoint::EncSlice as u32, 6);
        assert_eq!(Entrypoint::EncSliceLP as u32, 8);
    }

    #[test]
    fn test_profile_rt_format() {
        assert_eq!(Profile::H264High.rt_format(), ffi::VA_RT_FORMAT_YUV420);
        assert_eq!(Profile::HevcMain10.rt_format(), ffi::VA_RT_FORMAT_YUV420_10);
    }
}
