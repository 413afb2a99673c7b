//! Ingest result types

use crate::handle::{SealedFd, INVALID_FD};
use crate::session::Capture;
use crate::{ContainmentError, Result};
use serde::Serialize;
use std::os::unix::io::AsRawFd;

/// A successfully isolated file
#[derive(Debug)]
#[must_use = "the isolated handle stays open until disposed"]
pub struct Isolation {
    /// Sealed memfd holding the copy, owned by the caller
    pub handle: SealedFd,

    /// Number of bytes copied from the source
    pub size: u64,
}

/// Flat view of an ingest outcome: status flag, handle, size and message.
///
/// The `fd` here is informational only; it does not own the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsolationReport {
    /// Whether ingest succeeded
    pub success: bool,

    /// Handle number, or [`INVALID_FD`] on failure
    pub fd: i32,

    /// Bytes copied, 0 on failure
    pub size: u64,

    /// Diagnostic message, empty on success
    pub message: String,
}

impl IsolationReport {
    #[must_use]
    pub fn from_result(result: &Result<Isolation>) -> Self {
        match result {
            Ok(isolation) => Self::succeeded(&isolation.handle, isolation.size),
            Err(e) => Self::failed(e),
        }
    }

    #[must_use]
    pub fn captured(capture: &Capture) -> Self {
        Self::succeeded(capture.handle(), capture.size())
    }

    #[must_use]
    pub fn failed(error: &ContainmentError) -> Self {
        Self {
            success: false,
            fd: INVALID_FD,
            size: 0,
            message: error.to_string(),
        }
    }

    fn succeeded(handle: &SealedFd, size: u64) -> Self {
        Self {
            success: true,
            fd: handle.as_raw_fd(),
            size,
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_report_uses_sentinel() {
        let result: Result<Isolation> = Err(ContainmentError::InvalidArgument("label is empty".into()));

        let report = IsolationReport::from_result(&result);

        assert!(!report.success);
        assert_eq!(report.fd, INVALID_FD);
        assert_eq!(report.size, 0);
        assert_eq!(report.message, "invalid argument: label is empty");
    }

    #[test]
    fn success_report_has_empty_message() {
        let source = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(source.path(), b"12345").unwrap();
        let result = crate::isolate_file(source.path(), "report");

        let report = IsolationReport::from_result(&result);

        assert!(report.success);
        assert!(report.fd >= 0);
        assert_eq!(report.size, 5);
        assert!(report.message.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["size"], 5);

        result.unwrap().handle.dispose().unwrap();
    }
}
