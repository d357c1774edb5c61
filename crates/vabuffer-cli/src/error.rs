// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// DRM render node not found or inaccessible
    DeviceNotFound(String),
    /// libva missing or incomplete
    VaUnavailable(String),
    /// The VA driver refused a request (profile, allocation, mapping)
    DriverRejected(String),
    /// General error from the vabuffer library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CliError::VaUnavailable(msg) => write!(f, "VA-API unavailable: {}", msg),
            CliError::DriverRejected(msg) => write!(f, "Driver rejected request: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::DeviceNotFound(_) => ExitCode::from(3),
            CliError::VaUnavailable(_) => ExitCode::from(4),
            CliError::DriverRejected(_) => ExitCode::from(5),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map vabuffer::Error to CliError with appropriate exit codes
impl From<vabuffer::Error> for CliError {
    fn from(err: vabuffer::Error) -> Self {
        use vabuffer::Error;

        match err {
            // Loader problems -> VaUnavailable
            Error::LibraryNotLoaded(lib_err) => {
                CliError::VaUnavailable(format!("Failed to load libva: {}", lib_err))
            }
            Error::SymbolNotFound(sym) => {
                CliError::VaUnavailable(format!("Symbol not found: {}", sym))
            }

            // IO errors come from opening the render node
            Error::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound => {
                    CliError::DeviceNotFound(format!("Device not found: {}", io_err))
                }
                std::io::ErrorKind::PermissionDenied => {
                    CliError::DeviceNotFound(format!("Permission denied: {}", io_err))
                }
                _ => CliError::General(format!("I/O error: {}", io_err)),
            },

            Error::InvalidArgument(msg) => CliError::InvalidArgs(msg.to_string()),

            // Driver refusals
            Error::Allocation(_) | Error::Mapping(_) | Error::Va(_) => {
                CliError::DriverRejected(err.to_string())
            }

            Error::PartialCopy { .. } => CliError::General(err.to_string()),
            Error::Utf8(utf8_err) => CliError::General(format!("UTF-8 error: {}", utf8_err)),
            Error::NullPointer => CliError::General("Unexpected null pointer".to_string()),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
