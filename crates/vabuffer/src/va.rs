// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! libva implementation of the driver contract.

use crate::{
    driver::{
        BufferId, BufferType, ConfigId, ContextId, Driver, Entrypoint, Profile, SegmentHead,
        VaStatus,
    },
    Error,
};
use std::{
    ffi::CStr,
    fs::{File, OpenOptions},
    os::{
        fd::AsRawFd,
        raw::{c_int, c_void},
    },
    path::Path,
    ptr::{self, NonNull},
};
use vabuffer_sys as ffi;

/// A libva display, initialized and ready to take calls.
///
/// Displays opened with [`VaDriver::open_drm`] own the render node and are
/// terminated when dropped.
pub struct VaDriver {
    lib: &'static ffi::VaLibrary,
    display: ffi::VADisplay,
    version: Option<(i32, i32)>,
    _device: Option<File>,
    owned: bool,
}

// SAFETY: a VADisplay is not tied to the thread that created it, and the
// driver is only called through the display lock.
unsafe impl Send for VaDriver {}

/// Returns the first libva entry point the coded buffer path needs that the
/// loaded library does not export.
pub(crate) fn missing_symbol(lib: &ffi::VaLibrary) -> Option<&'static str> {
    let symbols = [
        ("vaInitialize", lib.vaInitialize.is_ok()),
        ("vaTerminate", lib.vaTerminate.is_ok()),
        ("vaQueryVendorString", lib.vaQueryVendorString.is_ok()),
        ("vaCreateConfig", lib.vaCreateConfig.is_ok()),
        ("vaDestroyConfig", lib.vaDestroyConfig.is_ok()),
        ("vaCreateContext", lib.vaCreateContext.is_ok()),
        ("vaDestroyContext", lib.vaDestroyContext.is_ok()),
        ("vaCreateBuffer", lib.vaCreateBuffer.is_ok()),
        ("vaDestroyBuffer", lib.vaDestroyBuffer.is_ok()),
        ("vaMapBuffer", lib.vaMapBuffer.is_ok()),
        ("vaUnmapBuffer", lib.vaUnmapBuffer.is_ok()),
    ];
    symbols
        .into_iter()
        .find(|(_, present)| !present)
        .map(|(name, _)| name)
}

impl VaDriver {
    /// Opens the DRM render node at `path` and initializes a display on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotLoaded`] or [`Error::SymbolNotFound`] if
    /// libva is unusable, [`Error::Io`] if the node cannot be opened,
    /// [`Error::NullPointer`] if libva-drm returns no display and
    /// [`Error::Va`] if `vaInitialize` fails.
    pub fn open_drm<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let lib = ffi::init()?;
        if let Some(symbol) = missing_symbol(lib) {
            return Err(Error::SymbolNotFound(symbol));
        }
        let drm = ffi::init_drm()?;
        if drm.vaGetDisplayDRM.is_err() {
            return Err(Error::SymbolNotFound("vaGetDisplayDRM"));
        }

        let path = path.as_ref();
        let device = OpenOptions::new().read(true).write(true).open(path)?;
        let display = unsafe { drm.vaGetDisplayDRM(device.as_raw_fd()) };
        if display.is_null() {
            return Err(Error::NullPointer);
        }

        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        if let Err(status) = va!(lib, vaInitialize(display, &mut major, &mut minor)) {
            unsafe { lib.vaTerminate(display) };
            return Err(Error::Va(status));
        }
        log::debug!("VA-API {}.{} on {}", major, minor, path.display());

        Ok(VaDriver {
            lib,
            display,
            version: Some((major, minor)),
            _device: Some(device),
            owned: true,
        })
    }

    /// Wraps a display initialized elsewhere. It is not terminated on drop.
    ///
    /// # Safety
    ///
    /// `display` must be an initialized VADisplay that outlives the returned
    /// driver, and must not be used concurrently from outside it.
    pub unsafe fn from_raw(display: ffi::VADisplay) -> Result<Self, Error> {
        if display.is_null() {
            return Err(Error::NullPointer);
        }
        let lib = ffi::init()?;
        if let Some(symbol) = missing_symbol(lib) {
            return Err(Error::SymbolNotFound(symbol));
        }
        Ok(VaDriver {
            lib,
            display,
            version: None,
            _device: None,
            owned: false,
        })
    }

    /// VA-API version reported by `vaInitialize`, unknown for wrapped
    /// displays.
    pub fn version(&self) -> Option<(i32, i32)> {
        self.version
    }

    /// Driver vendor string.
    pub fn vendor(&self) -> Result<String, Error> {
        let vendor = unsafe { self.lib.vaQueryVendorString(self.display) };
        if vendor.is_null() {
            return Err(Error::NullPointer);
        }
        let vendor = unsafe { CStr::from_ptr(vendor) };
        Ok(vendor.to_str()?.to_owned())
    }

    pub fn as_raw(&self) -> ffi::VADisplay {
        self.display
    }
}

impl Drop for VaDriver {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        if let Err(status) = va!(self.lib, vaTerminate(self.display)) {
            log::warn!("VaDriver::drop() - vaTerminate failed: {}", status);
        }
    }
}

// SAFETY: libva keeps the segment chain of a mapped coded buffer valid until
// vaUnmapBuffer or vaDestroyBuffer.
unsafe impl Driver for VaDriver {
    fn create_config(
        &self,
        profile: Profile,
        entrypoint: Entrypoint,
    ) -> Result<ConfigId, VaStatus> {
        let mut attrib = ffi::VAConfigAttrib {
            type_: ffi::VAConfigAttribRTFormat,
            value: profile.rt_format(),
        };
        let mut config: ConfigId = ffi::VA_INVALID_ID;
        va!(
            self.lib,
            vaCreateConfig(
                self.display,
                profile as ffi::VAProfile,
                entrypoint as ffi::VAEntrypoint,
                &mut attrib,
                1,
                &mut config
            )
        )?;
        Ok(config)
    }

    fn destroy_config(&self, config: ConfigId) -> Result<(), VaStatus> {
        va!(self.lib, vaDestroyConfig(self.display, config))
    }

    fn create_context(
        &self,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<ContextId, VaStatus> {
        let width = c_int::try_from(width).map_err(|_| VaStatus::INVALID_PARAMETER)?;
        let height = c_int::try_from(height).map_err(|_| VaStatus::INVALID_PARAMETER)?;
        let mut context: ContextId = ffi::VA_INVALID_ID;
        va!(
            self.lib,
            vaCreateContext(
                self.display,
                config,
                width,
                height,
                ffi::VA_PROGRESSIVE,
                ptr::null_mut(),
                0,
                &mut context
            )
        )?;
        Ok(context)
    }

    fn destroy_context(&self, context: ContextId) -> Result<(), VaStatus> {
        va!(self.lib, vaDestroyContext(self.display, context))
    }

    fn create_buffer(
        &self,
        context: ContextId,
        buffer_type: BufferType,
        size: u32,
    ) -> Result<BufferId, VaStatus> {
        let mut buffer: BufferId = ffi::VA_INVALID_ID;
        va!(
            self.lib,
            vaCreateBuffer(
                self.display,
                context,
                buffer_type,
                size,
                1,
                ptr::null_mut(),
                &mut buffer
            )
        )?;
        Ok(buffer)
    }

    fn destroy_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        va!(self.lib, vaDestroyBuffer(self.display, buffer))
    }

    fn map_buffer(&self, buffer: BufferId) -> Result<SegmentHead, VaStatus> {
        let mut data: *mut c_void = ptr::null_mut();
        va!(self.lib, vaMapBuffer(self.display, buffer, &mut data))?;
        if data.is_null() {
            // A coded buffer always maps to at least one segment
            if let Err(status) = va!(self.lib, vaUnmapBuffer(self.display, buffer)) {
                log::warn!("buffer {:#010x}: unmap failed: {}", buffer, status);
            }
            return Err(VaStatus::OPERATION_FAILED);
        }
        Ok(NonNull::new(data.cast::<ffi::VACodedBufferSegment>()))
    }

    fn unmap_buffer(&self, buffer: BufferId) -> Result<(), VaStatus> {
        va!(self.lib, vaUnmapBuffer(self.display, buffer))
    }
}
