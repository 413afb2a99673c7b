//! Error types for spiritbox-core

use std::io;
use std::os::unix::io::RawFd;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainmentError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("memfd_create failed: {0}")]
    ResourceCreationFailed(#[source] memfd::Error),

    #[error("unable to open source file {}: {source}", .path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("bad handle {fd}: {source}")]
    BadHandle { fd: RawFd, source: io::Error },

    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("flush failed: {0}")]
    FlushFailed(#[source] io::Error),

    #[error("fcntl seal failed: {0}")]
    SealFailed(#[source] memfd::Error),

    #[error("unable to create destination {}: {source}", .path.display())]
    DestinationUnwritable { path: PathBuf, source: io::Error },

    #[error("failed to restrict permissions on {}: {source}", .path.display())]
    PermissionChangeFailed { path: PathBuf, source: io::Error },

    #[error("close failed on handle {fd}: {source}")]
    CloseFailed { fd: RawFd, source: nix::Error },
}

/// Classification of a [`ContainmentError`], stable across the C ABI.
///
/// The discriminants are the absolute values of the status codes returned by
/// the FFI layer: a failing `export_fd` or `close_fd` returns `-(kind as i32)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    InvalidArgument = 1,
    ResourceCreationFailed = 2,
    SourceUnreadable = 3,
    BadHandle = 4,
    ReadFailed = 5,
    WriteFailed = 6,
    FlushFailed = 7,
    SealFailed = 8,
    DestinationUnwritable = 9,
    PermissionChangeFailed = 10,
    CloseFailed = 11,
}

impl ErrorKind {
    /// Negative status code for this kind
    #[must_use]
    pub const fn status(self) -> i32 {
        -(self as i32)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::ResourceCreationFailed => "resource_creation_failed",
            Self::SourceUnreadable => "source_unreadable",
            Self::BadHandle => "bad_handle",
            Self::ReadFailed => "read_failed",
            Self::WriteFailed => "write_failed",
            Self::FlushFailed => "flush_failed",
            Self::SealFailed => "seal_failed",
            Self::DestinationUnwritable => "destination_unwritable",
            Self::PermissionChangeFailed => "permission_change_failed",
            Self::CloseFailed => "close_failed",
        }
    }
}

impl ContainmentError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::ResourceCreationFailed(_) => ErrorKind::ResourceCreationFailed,
            Self::SourceUnreadable { .. } => ErrorKind::SourceUnreadable,
            Self::BadHandle { .. } => ErrorKind::BadHandle,
            Self::ReadFailed(_) => ErrorKind::ReadFailed,
            Self::WriteFailed(_) => ErrorKind::WriteFailed,
            Self::FlushFailed(_) => ErrorKind::FlushFailed,
            Self::SealFailed(_) => ErrorKind::SealFailed,
            Self::DestinationUnwritable { .. } => ErrorKind::DestinationUnwritable,
            Self::PermissionChangeFailed { .. } => ErrorKind::PermissionChangeFailed,
            Self::CloseFailed { .. } => ErrorKind::CloseFailed,
        }
    }

    /// The errno behind this error, if the OS reported one
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::InvalidArgument(_) => Some(nix::libc::EINVAL),
            Self::ResourceCreationFailed(e) | Self::SealFailed(e) => {
                std::error::Error::source(e)
                    .and_then(|s| s.downcast_ref::<io::Error>())
                    .and_then(io::Error::raw_os_error)
            }
            Self::SourceUnreadable { source, .. }
            | Self::BadHandle { source, .. }
            | Self::DestinationUnwritable { source, .. }
            | Self::PermissionChangeFailed { source, .. }
            | Self::ReadFailed(source)
            | Self::WriteFailed(source)
            | Self::FlushFailed(source) => source.raw_os_error(),
            Self::CloseFailed { source, .. } => Some(*source as i32),
        }
    }
}
