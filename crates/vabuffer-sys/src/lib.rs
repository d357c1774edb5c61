// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

include!("ffi.rs");

// Re-export libloading for error handling
pub use libloading;

use std::sync::{Mutex, OnceLock, PoisonError};

static LIBVA: OnceLock<VaLibrary> = OnceLock::new();
static LIBVA_DRM: OnceLock<VaDrmLibrary> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Default soname of the core VA-API library.
pub const DEFAULT_LIBVA: &str = "libva.so.2";

/// Default soname of the VA-API DRM display backend.
pub const DEFAULT_LIBVA_DRM: &str = "libva-drm.so.2";

fn load<T>(
    cell: &'static OnceLock<T>,
    env_var: &str,
    default: &str,
    open: impl FnOnce(&str) -> Result<T, libloading::Error>,
) -> Result<&'static T, libloading::Error> {
    if let Some(lib) = cell.get() {
        return Ok(lib);
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    // Double-check after acquiring lock
    if let Some(lib) = cell.get() {
        return Ok(lib);
    }

    let lib_path = std::env::var(env_var)
        .ok()
        .unwrap_or_else(|| default.to_string());

    let lib = open(lib_path.as_str())?;
    Ok(cell.get_or_init(|| lib))
}

/// Initialize the VA-API bindings by loading libva.
///
/// This must be called before using any other VA-API function. Returns an
/// error if the library cannot be loaded.
///
/// The environment variable `VABUFFER_LIBVA` can be used to specify a custom
/// path to the library. If not set, the dynamic loader searches for
/// `libva.so.2` in the standard system paths.
pub fn init() -> Result<&'static VaLibrary, libloading::Error> {
    load(&LIBVA, "VABUFFER_LIBVA", DEFAULT_LIBVA, |path| unsafe {
        VaLibrary::new(path)
    })
}

/// Initialize the DRM display backend by loading libva-drm.
///
/// `VABUFFER_LIBVA_DRM` overrides the library path, defaulting to
/// `libva-drm.so.2`.
pub fn init_drm() -> Result<&'static VaDrmLibrary, libloading::Error> {
    load(
        &LIBVA_DRM,
        "VABUFFER_LIBVA_DRM",
        DEFAULT_LIBVA_DRM,
        |path| unsafe { VaDrmLibrary::new(path) },
    )
}

/// Try to get a reference to the loaded libva without loading it
pub fn try_library() -> Option<&'static VaLibrary> {
    LIBVA.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn coded_buffer_segment_layout() {
        // Must match sizeof(VACodedBufferSegment) on LP64 targets
        if size_of::<usize>() == 8 {
            assert_eq!(size_of::<VACodedBufferSegment>(), 48);
            assert_eq!(align_of::<VACodedBufferSegment>(), 8);
        }
    }

    #[test]
    fn invalid_id_sentinel() {
        assert_eq!(VA_INVALID_ID, u32::MAX);
        assert_eq!(VA_STATUS_ERROR_UNKNOWN, -1);
    }

    #[test]
    fn missing_library_reports_error() {
        let res = unsafe { VaLibrary::new("libva-does-not-exist.so.0") };
        assert!(res.is_err());
    }
}
