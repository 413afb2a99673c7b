//! # spiritbox-core
//!
//! Sealed in-memory containment of file contents.
//!
//! This crate provides the isolate/seal/export/dispose lifecycle:
//! - Ingest a file into an anonymous memfd and seal it against mutation
//! - Export the sealed content back to a read-only (`0o444`) file
//! - Dispose of the handle explicitly, with close failures reported
//! - A caller-side session that tracks several captures at once

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod copy;
pub mod dispose;
pub mod error;
pub mod export;
pub mod handle;
pub mod ingest;
pub mod result;
pub mod session;

pub use config::ContainmentConfig;
pub use dispose::close_fd;
pub use error::{ContainmentError, ErrorKind};
pub use export::{export_fd, export_fd_with, EXPORT_MODE};
pub use handle::{SealSet, SealedFd, INVALID_FD, REQUIRED_SEALS};
pub use ingest::{isolate_file, isolate_file_with};
pub use result::{Isolation, IsolationReport};
pub use session::{Capture, ContainmentSession};

/// Crate-level result type
pub type Result<T> = std::result::Result<T, ContainmentError>;
