//! Process exit codes.
//!
//! Values 64-78 follow BSD `sysexits.h` (taken from the `exitcode` crate);
//! 100 and up are specific to this tool.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AdminExitCode {
    Success = exitcode::OK,

    /// Bad command line or missing mandatory value
    UsageError = exitcode::USAGE,

    DataError = exitcode::DATAERR,

    /// Server answered 404
    NotFound = exitcode::NOUSER,

    SoftwareError = exitcode::SOFTWARE,

    /// Credential files or key storage could not be read or written
    IoError = exitcode::IOERR,

    ConfigError = exitcode::CONFIG,

    /// Credential rejected, token stale, or no credential available
    AuthError = 100,

    /// Server unreachable or TLS failure
    NetworkError = 101,

    /// Remote API returned an error, or some items of a batch failed
    ApiError = 102,
}

impl AdminExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            AdminExitCode::Success => "Success",
            AdminExitCode::UsageError => "Command line usage error",
            AdminExitCode::DataError => "Data format error",
            AdminExitCode::NotFound => "Resource not found",
            AdminExitCode::SoftwareError => "Internal software error",
            AdminExitCode::IoError => "Input/output error",
            AdminExitCode::ConfigError => "Configuration error",
            AdminExitCode::AuthError => "Authentication error",
            AdminExitCode::NetworkError => "Network communication error",
            AdminExitCode::ApiError => "Remote API error",
        }
    }
}

impl From<AdminExitCode> for i32 {
    fn from(code: AdminExitCode) -> Self {
        code.code()
    }
}
