// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! VA-API Coded Buffers for Rust
//!
//! Safe management of the output buffers of a VA-API hardware video encoder.
//! A coded buffer is a handle into the driver's memory holding compressed
//! video; once the encoder has written to it, the driver exposes its content
//! as a chain of segments. This crate owns the buffer lifecycle
//! (create/map/unmap/destroy), serializes every driver call through a shared
//! device lock, and linearizes the segment chain into ordinary byte buffers.
//!
//! # Quick Start
//!
//! ```no_run
//! use vabuffer::coded_buffer::CodedBuffer;
//! use vabuffer::context::Context;
//! use vabuffer::display::Display;
//! use vabuffer::driver::{Entrypoint, Profile};
//!
//! let display = Display::open_drm("/dev/dri/renderD128")?;
//! let context = Context::new(
//!     &display,
//!     Profile::H264ConstrainedBaseline,
//!     Entrypoint::EncSlice,
//!     1920,
//!     1080,
//! )?;
//! let mut coded = CodedBuffer::new(&context, 1920 * 1080 * 3 / 2)?;
//!
//! // ... submit a picture that targets coded.id() ...
//!
//! let bitstream = coded.read_to_vec()?;
//! println!("encoded {} bytes", bitstream.len());
//! # Ok::<(), vabuffer::Error>(())
//! ```
//!
//! # Testing without hardware
//!
//! [`mock::MockDriver`] implements the same driver contract in software and
//! lets tests script the segments an encoder would have produced.

use std::{error, fmt, io, str};
use vabuffer_sys as ffi;

pub use driver::VaStatus;

/// Error type for coded buffer operations
#[derive(Debug)]
pub enum Error {
    /// libva (or libva-drm) could not be loaded at runtime
    LibraryNotLoaded(ffi::libloading::Error),

    /// A required libva entry point is missing from the loaded library
    SymbolNotFound(&'static str),

    /// I/O error opening the DRM render node
    Io(io::Error),

    /// UTF-8 conversion error when converting C strings to Rust strings
    Utf8(str::Utf8Error),

    /// Rejected before reaching the driver: zero or oversized buffer size,
    /// or zero picture dimensions
    InvalidArgument(&'static str),

    /// The driver refused to allocate the coded buffer
    Allocation(VaStatus),

    /// The driver refused to map the coded buffer
    Mapping(VaStatus),

    /// The destination could not take a whole segment. `copied` bytes (the
    /// fully transferred segments) were written out of `required`.
    PartialCopy { copied: usize, required: usize },

    /// Any other driver call failed
    Va(VaStatus),

    /// Null pointer returned by libva where a valid pointer was expected
    NullPointer,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LibraryNotLoaded(err) => write!(f, "libva could not be loaded: {}", err),
            Error::SymbolNotFound(sym) => write!(f, "libva symbol not found: {}", sym),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Utf8(err) => write!(f, "UTF-8 conversion error: {}", err),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Allocation(status) => write!(f, "coded buffer allocation failed: {}", status),
            Error::Mapping(status) => write!(f, "coded buffer mapping failed: {}", status),
            Error::PartialCopy { copied, required } => write!(
                f,
                "destination too small: copied {} of {} bytes",
                copied, required
            ),
            Error::Va(status) => write!(f, "VA-API call failed: {}", status),
            Error::NullPointer => write!(f, "Null pointer returned from libva"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LibraryNotLoaded(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Utf8(err) => Some(err),
            Error::Allocation(status) | Error::Mapping(status) | Error::Va(status) => Some(status),
            Error::SymbolNotFound(_)
            | Error::InvalidArgument(_)
            | Error::PartialCopy { .. }
            | Error::NullPointer => None,
        }
    }
}

impl From<ffi::libloading::Error> for Error {
    fn from(err: ffi::libloading::Error) -> Self {
        Error::LibraryNotLoaded(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<str::Utf8Error> for Error {
    fn from(err: str::Utf8Error) -> Self {
        Error::Utf8(err)
    }
}

/// Calls a libva entry point and turns its status into a `Result`.
macro_rules! va {
    ($lib:expr, $fn_name:ident($($args:expr),*)) => {
        {
            #[allow(clippy::macro_metavars_in_unsafe)]
            let status = unsafe { $lib.$fn_name($($args),*) };
            $crate::driver::VaStatus::check(status)
        }
    };
}

/// The driver module defines the contract the device must fulfil.
pub mod driver;

/// The display module provides the shared, locked device handle.
pub mod display;

/// The context module provides the encoding context coded buffers belong to.
pub mod context;

/// The fill module defines how segments are written into destinations.
pub mod fill;

/// The segment module walks and linearizes mapped coded buffer segments.
pub mod segment;

/// The coded_buffer module provides the coded buffer resource.
pub mod coded_buffer;

/// The va module implements the driver contract on top of libva.
pub mod va;

/// The mock module provides a software driver for tests.
pub mod mock;

/// Check whether libva can be loaded and exposes every entry point this
/// crate needs.
///
/// # Example
///
/// ```no_run
/// if vabuffer::is_available().unwrap_or(false) {
///     // Safe to open a display
/// }
/// ```
pub fn is_available() -> Result<bool, Error> {
    let lib = ffi::init()?;
    Ok(va::missing_symbol(lib).is_none())
}
