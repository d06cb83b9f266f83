// Consistent exit codes for the cowrite CLI.
//
//   0  = success
//   1  = general error
//   2  = usage error (bad name, no workspace open)
//   3  = document not found
//   10 = folder access must be granted again
//   11 = unsupported here (no cloud store, nested delete)
//   13 = read/write, network, or auth failure

use std::process;

use cowrite_core::error::ErrorKind;

use crate::output::reported_error;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Permission = 10,
    Unsupported = 11,
    Io = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        match reported_error(err) {
            Some(reported) => Self::from_kind(reported.kind),
            None => Self::Error,
        }
    }

    pub fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput | ErrorKind::InvalidState => Self::Usage,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::Permission,
            ErrorKind::Unsupported | ErrorKind::UnsupportedOperation => Self::Unsupported,
            ErrorKind::Io => Self::Io,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
