// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// Runtime-loaded subset of <va/va.h> and <va/va_drm.h>.
//
// Layout follows `bindgen --dynamic-loading`: every entry point is resolved
// once when the library is opened and kept as a `Result` so callers can check
// for optional symbols before calling them.

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub type VADisplay = *mut c_void;
pub type VAStatus = c_int;
pub type VAGenericID = c_uint;
pub type VAConfigID = VAGenericID;
pub type VAContextID = VAGenericID;
pub type VASurfaceID = VAGenericID;
pub type VABufferID = VAGenericID;
pub type VAProfile = c_int;
pub type VAEntrypoint = c_uint;
pub type VABufferType = c_uint;
pub type VAConfigAttribType = c_uint;

pub const VA_INVALID_ID: VAGenericID = 0xffff_ffff;
pub const VA_PADDING_LOW: usize = 4;
pub const VA_PROGRESSIVE: c_int = 0x0000_0001;

pub const VA_STATUS_SUCCESS: VAStatus = 0x0000_0000;
pub const VA_STATUS_ERROR_OPERATION_FAILED: VAStatus = 0x0000_0001;
pub const VA_STATUS_ERROR_ALLOCATION_FAILED: VAStatus = 0x0000_0002;
pub const VA_STATUS_ERROR_INVALID_DISPLAY: VAStatus = 0x0000_0003;
pub const VA_STATUS_ERROR_INVALID_CONFIG: VAStatus = 0x0000_0004;
pub const VA_STATUS_ERROR_INVALID_CONTEXT: VAStatus = 0x0000_0005;
pub const VA_STATUS_ERROR_INVALID_SURFACE: VAStatus = 0x0000_0006;
pub const VA_STATUS_ERROR_INVALID_BUFFER: VAStatus = 0x0000_0007;
pub const VA_STATUS_ERROR_INVALID_IMAGE: VAStatus = 0x0000_0008;
pub const VA_STATUS_ERROR_INVALID_SUBPICTURE: VAStatus = 0x0000_0009;
pub const VA_STATUS_ERROR_ATTR_NOT_SUPPORTED: VAStatus = 0x0000_000a;
pub const VA_STATUS_ERROR_MAX_NUM_EXCEEDED: VAStatus = 0x0000_000b;
pub const VA_STATUS_ERROR_UNSUPPORTED_PROFILE: VAStatus = 0x0000_000c;
pub const VA_STATUS_ERROR_UNSUPPORTED_ENTRYPOINT: VAStatus = 0x0000_000d;
pub const VA_STATUS_ERROR_UNSUPPORTED_RT_FORMAT: VAStatus = 0x0000_000e;
pub const VA_STATUS_ERROR_UNSUPPORTED_BUFFERTYPE: VAStatus = 0x0000_000f;
pub const VA_STATUS_ERROR_SURFACE_BUSY: VAStatus = 0x0000_0010;
pub const VA_STATUS_ERROR_FLAG_NOT_SUPPORTED: VAStatus = 0x0000_0011;
pub const VA_STATUS_ERROR_INVALID_PARAMETER: VAStatus = 0x0000_0012;
pub const VA_STATUS_ERROR_RESOLUTION_NOT_SUPPORTED: VAStatus = 0x0000_0013;
pub const VA_STATUS_ERROR_UNIMPLEMENTED: VAStatus = 0x0000_0014;
pub const VA_STATUS_ERROR_SURFACE_IN_DISPLAYING: VAStatus = 0x0000_0015;
pub const VA_STATUS_ERROR_INVALID_IMAGE_FORMAT: VAStatus = 0x0000_0016;
pub const VA_STATUS_ERROR_DECODING_ERROR: VAStatus = 0x0000_0017;
pub const VA_STATUS_ERROR_ENCODING_ERROR: VAStatus = 0x0000_0018;
pub const VA_STATUS_ERROR_INVALID_VALUE: VAStatus = 0x0000_0019;
pub const VA_STATUS_ERROR_UNSUPPORTED_FILTER: VAStatus = 0x0000_0020;
pub const VA_STATUS_ERROR_INVALID_FILTER_CHAIN: VAStatus = 0x0000_0021;
pub const VA_STATUS_ERROR_HW_BUSY: VAStatus = 0x0000_0022;
pub const VA_STATUS_ERROR_UNSUPPORTED_MEMORY_TYPE: VAStatus = 0x0000_0024;
pub const VA_STATUS_ERROR_NOT_ENOUGH_BUFFER: VAStatus = 0x0000_0025;
pub const VA_STATUS_ERROR_TIMEDOUT: VAStatus = 0x0000_0026;
pub const VA_STATUS_ERROR_UNKNOWN: VAStatus = 0xffff_ffff_u32 as VAStatus;

pub const VAProfileH264Main: VAProfile = 6;
pub const VAProfileH264High: VAProfile = 7;
pub const VAProfileH264ConstrainedBaseline: VAProfile = 13;
pub const VAProfileHEVCMain: VAProfile = 17;
pub const VAProfileHEVCMain10: VAProfile = 18;
pub const VAProfileVP9Profile0: VAProfile = 19;
pub const VAProfileAV1Profile0: VAProfile = 32;

pub const VAEntrypointEncSlice: VAEntrypoint = 6;
pub const VAEntrypointEncPicture: VAEntrypoint = 7;
pub const VAEntrypointEncSliceLP: VAEntrypoint = 8;

pub const VAConfigAttribRTFormat: VAConfigAttribType = 0;
pub const VA_RT_FORMAT_YUV420: c_uint = 0x0000_0001;
pub const VA_RT_FORMAT_YUV420_10: c_uint = 0x0000_0100;

pub const VAEncCodedBufferType: VABufferType = 21;

pub const VA_CODED_BUF_STATUS_PICTURE_AVE_QP_MASK: c_uint = 0xff;
pub const VA_CODED_BUF_STATUS_LARGE_SLICE_MASK: c_uint = 0x100;
pub const VA_CODED_BUF_STATUS_SLICE_OVERFLOW_MASK: c_uint = 0x200;
pub const VA_CODED_BUF_STATUS_BITRATE_OVERFLOW: c_uint = 0x400;
pub const VA_CODED_BUF_STATUS_BITRATE_HIGH: c_uint = 0x800;
pub const VA_CODED_BUF_STATUS_FRAME_SIZE_OVERFLOW: c_uint = 0x1000;
pub const VA_CODED_BUF_STATUS_BAD_BITSTREAM: c_uint = 0x8000;
pub const VA_CODED_BUF_STATUS_AIR_MB_OVER_THRESHOLD: c_uint = 0x00ff_0000;
pub const VA_CODED_BUF_STATUS_NUMBER_PASSES_MASK: c_uint = 0x0f00_0000;
pub const VA_CODED_BUF_STATUS_SINGLE_NALU: c_uint = 0x1000_0000;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VAConfigAttrib {
    pub type_: VAConfigAttribType,
    pub value: u32,
}

/// One link of the segment chain returned by `vaMapBuffer` on a coded buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VACodedBufferSegment {
    pub size: u32,
    pub bit_offset: u32,
    pub status: u32,
    pub reserved: u32,
    pub buf: *mut c_void,
    pub next: *mut c_void,
    pub va_reserved: [u32; VA_PADDING_LOW],
}

impl Default for VACodedBufferSegment {
    fn default() -> Self {
        VACodedBufferSegment {
            size: 0,
            bit_offset: 0,
            status: 0,
            reserved: 0,
            buf: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
            va_reserved: [0; VA_PADDING_LOW],
        }
    }
}

pub struct VaLibrary {
    __library: ::libloading::Library,
    pub vaInitialize: Result<
        unsafe extern "C" fn(
            dpy: VADisplay,
            major_version: *mut c_int,
            minor_version: *mut c_int,
        ) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaTerminate: Result<unsafe extern "C" fn(dpy: VADisplay) -> VAStatus, ::libloading::Error>,
    pub vaQueryVendorString:
        Result<unsafe extern "C" fn(dpy: VADisplay) -> *const c_char, ::libloading::Error>,
    pub vaCreateConfig: Result<
        unsafe extern "C" fn(
            dpy: VADisplay,
            profile: VAProfile,
            entrypoint: VAEntrypoint,
            attrib_list: *mut VAConfigAttrib,
            num_attribs: c_int,
            config_id: *mut VAConfigID,
        ) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaDestroyConfig: Result<
        unsafe extern "C" fn(dpy: VADisplay, config_id: VAConfigID) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaCreateContext: Result<
        unsafe extern "C" fn(
            dpy: VADisplay,
            config_id: VAConfigID,
            picture_width: c_int,
            picture_height: c_int,
            flag: c_int,
            render_targets: *mut VASurfaceID,
            num_render_targets: c_int,
            context: *mut VAContextID,
        ) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaDestroyContext: Result<
        unsafe extern "C" fn(dpy: VADisplay, context: VAContextID) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaCreateBuffer: Result<
        unsafe extern "C" fn(
            dpy: VADisplay,
            context: VAContextID,
            type_: VABufferType,
            size: c_uint,
            num_elements: c_uint,
            data: *mut c_void,
            buf_id: *mut VABufferID,
        ) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaDestroyBuffer: Result<
        unsafe extern "C" fn(dpy: VADisplay, buffer_id: VABufferID) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaMapBuffer: Result<
        unsafe extern "C" fn(dpy: VADisplay, buf_id: VABufferID, pbuf: *mut *mut c_void) -> VAStatus,
        ::libloading::Error,
    >,
    pub vaUnmapBuffer: Result<
        unsafe extern "C" fn(dpy: VADisplay, buf_id: VABufferID) -> VAStatus,
        ::libloading::Error,
    >,
}

impl VaLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: ::libloading::AsFilename,
    {
        let library = unsafe { ::libloading::Library::new(path)? };
        unsafe { Self::from_library(library) }
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let vaInitialize = unsafe { __library.get(b"vaInitialize\0").map(|sym| *sym) };
        let vaTerminate = unsafe { __library.get(b"vaTerminate\0").map(|sym| *sym) };
        let vaQueryVendorString =
            unsafe { __library.get(b"vaQueryVendorString\0").map(|sym| *sym) };
        let vaCreateConfig = unsafe { __library.get(b"vaCreateConfig\0").map(|sym| *sym) };
        let vaDestroyConfig = unsafe { __library.get(b"vaDestroyConfig\0").map(|sym| *sym) };
        let vaCreateContext = unsafe { __library.get(b"vaCreateContext\0").map(|sym| *sym) };
        let vaDestroyContext = unsafe { __library.get(b"vaDestroyContext\0").map(|sym| *sym) };
        let vaCreateBuffer = unsafe { __library.get(b"vaCreateBuffer\0").map(|sym| *sym) };
        let vaDestroyBuffer = unsafe { __library.get(b"vaDestroyBuffer\0").map(|sym| *sym) };
        let vaMapBuffer = unsafe { __library.get(b"vaMapBuffer\0").map(|sym| *sym) };
        let vaUnmapBuffer = unsafe { __library.get(b"vaUnmapBuffer\0").map(|sym| *sym) };
        Ok(VaLibrary {
            __library,
            vaInitialize,
            vaTerminate,
            vaQueryVendorString,
            vaCreateConfig,
            vaDestroyConfig,
            vaCreateContext,
            vaDestroyContext,
            vaCreateBuffer,
            vaDestroyBuffer,
            vaMapBuffer,
            vaUnmapBuffer,
        })
    }

    pub unsafe fn vaInitialize(
        &self,
        dpy: VADisplay,
        major_version: *mut c_int,
        minor_version: *mut c_int,
    ) -> VAStatus {
        unsafe {
            (self.vaInitialize.as_ref().expect("Expected function, got error."))(
                dpy,
                major_version,
                minor_version,
            )
        }
    }

    pub unsafe fn vaTerminate(&self, dpy: VADisplay) -> VAStatus {
        unsafe { (self.vaTerminate.as_ref().expect("Expected function, got error."))(dpy) }
    }

    pub unsafe fn vaQueryVendorString(&self, dpy: VADisplay) -> *const c_char {
        unsafe { (self.vaQueryVendorString.as_ref().expect("Expected function, got error."))(dpy) }
    }

    pub unsafe fn vaCreateConfig(
        &self,
        dpy: VADisplay,
        profile: VAProfile,
        entrypoint: VAEntrypoint,
        attrib_list: *mut VAConfigAttrib,
        num_attribs: c_int,
        config_id: *mut VAConfigID,
    ) -> VAStatus {
        unsafe {
            (self.vaCreateConfig.as_ref().expect("Expected function, got error."))(
                dpy,
                profile,
                entrypoint,
                attrib_list,
                num_attribs,
                config_id,
            )
        }
    }

    pub unsafe fn vaDestroyConfig(&self, dpy: VADisplay, config_id: VAConfigID) -> VAStatus {
        unsafe {
            (self.vaDestroyConfig.as_ref().expect("Expected function, got error."))(dpy, config_id)
        }
    }

    pub unsafe fn vaCreateContext(
        &self,
        dpy: VADisplay,
        config_id: VAConfigID,
        picture_width: c_int,
        picture_height: c_int,
        flag: c_int,
        render_targets: *mut VASurfaceID,
        num_render_targets: c_int,
        context: *mut VAContextID,
    ) -> VAStatus {
        unsafe {
            (self.vaCreateContext.as_ref().expect("Expected function, got error."))(
                dpy,
                config_id,
                picture_width,
                picture_height,
                flag,
                render_targets,
                num_render_targets,
                context,
            )
        }
    }

    pub unsafe fn vaDestroyContext(&self, dpy: VADisplay, context: VAContextID) -> VAStatus {
        unsafe {
            (self.vaDestroyContext.as_ref().expect("Expected function, got error."))(dpy, context)
        }
    }

    pub unsafe fn vaCreateBuffer(
        &self,
        dpy: VADisplay,
        context: VAContextID,
        type_: VABufferType,
        size: c_uint,
        num_elements: c_uint,
        data: *mut c_void,
        buf_id: *mut VABufferID,
    ) -> VAStatus {
        unsafe {
            (self.vaCreateBuffer.as_ref().expect("Expected function, got error."))(
                dpy,
                context,
                type_,
                size,
                num_elements,
                data,
                buf_id,
            )
        }
    }

    pub unsafe fn vaDestroyBuffer(&self, dpy: VADisplay, buffer_id: VABufferID) -> VAStatus {
        unsafe {
            (self.vaDestroyBuffer.as_ref().expect("Expected function, got error."))(dpy, buffer_id)
        }
    }

    pub unsafe fn vaMapBuffer(
        &self,
        dpy: VADisplay,
        buf_id: VABufferID,
        pbuf: *mut *mut c_void,
    ) -> VAStatus {
        unsafe {
            (self.vaMapBuffer.as_ref().expect("Expected function, got error."))(dpy, buf_id, pbuf)
        }
    }

    pub unsafe fn vaUnmapBuffer(&self, dpy: VADisplay, buf_id: VABufferID) -> VAStatus {
        unsafe { (self.vaUnmapBuffer.as_ref().expect("Expected function, got error."))(dpy, buf_id) }
    }
}

pub struct VaDrmLibrary {
    __library: ::libloading::Library,
    pub vaGetDisplayDRM: Result<unsafe extern "C" fn(fd: c_int) -> VADisplay, ::libloading::Error>,
}

impl VaDrmLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: ::libloading::AsFilename,
    {
        let library = unsafe { ::libloading::Library::new(path)? };
        unsafe { Self::from_library(library) }
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let vaGetDisplayDRM = unsafe { __library.get(b"vaGetDisplayDRM\0").map(|sym| *sym) };
        Ok(VaDrmLibrary {
            __library,
            vaGetDisplayDRM,
        })
    }

    pub unsafe fn vaGetDisplayDRM(&self, fd: c_int) -> VADisplay {
        unsafe { (self.vaGetDisplayDRM.as_ref().expect("Expected function, got error."))(fd) }
    }
}
