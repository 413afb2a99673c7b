//! Export: write sealed content back to a read-only file

use crate::copy::{copy_chunks, CopyError};
use crate::handle::proc_fd_path;
use crate::{ContainmentConfig, ContainmentError, Result};
use std::fs::{File, Permissions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::RawFd;
use std::path::Path;

/// Permission bits of every exported file (r--r--r--)
pub const EXPORT_MODE: u32 = 0o444;

/// Export the content behind `fd` to `destination`, using default settings.
///
/// See [`export_fd_with`].
pub fn export_fd(fd: RawFd, destination: &Path) -> Result<u64> {
    export_fd_with(fd, destination, &ContainmentConfig::default())
}

/// Export the content behind `fd` to `destination` and make it read-only.
///
/// The content is re-read through `/proc/self/fd/<fd>`, which yields a new
/// open file description starting at offset 0, so `fd` itself is neither
/// moved nor closed and export can be repeated. The destination is created
/// or truncated, filled, flushed, then set to [`EXPORT_MODE`] regardless of
/// umask.
///
/// Returns the number of bytes written. If this fails with
/// `PermissionChangeFailed`, the destination content is already complete.
pub fn export_fd_with(fd: RawFd, destination: &Path, config: &ContainmentConfig) -> Result<u64> {
    if fd < 0 {
        return Err(ContainmentError::invalid(format!("handle {fd} is negative")));
    }
    if destination.as_os_str().is_empty() {
        return Err(ContainmentError::invalid("destination path is empty"));
    }
    if config.chunk_size == 0 {
        return Err(ContainmentError::invalid("chunk size is zero"));
    }

    let mut source = File::open(proc_fd_path(fd))
        .map_err(|source| ContainmentError::BadHandle { fd, source })?;

    tracing::debug!(fd, destination = %destination.display(), "exporting memfd");
    let dest = File::create(destination).map_err(|source| ContainmentError::DestinationUnwritable {
        path: destination.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::with_capacity(config.chunk_size, dest);
    let written = copy_chunks(&mut source, &mut writer, config.chunk_size).map_err(|e| match e {
        CopyError::Read(e) => ContainmentError::ReadFailed(e),
        CopyError::Write(e) => ContainmentError::WriteFailed(e),
    })?;

    writer.flush().map_err(ContainmentError::FlushFailed)?;
    let dest = writer
        .into_inner()
        .map_err(|e| ContainmentError::FlushFailed(e.into_error()))?;
    if config.sync_on_export {
        dest.sync_all().map_err(ContainmentError::FlushFailed)?;
    }

    dest.set_permissions(Permissions::from_mode(EXPORT_MODE))
        .map_err(|source| ContainmentError::PermissionChangeFailed {
            path: destination.to_path_buf(),
            source,
        })?;

    tracing::info!(fd, destination = %destination.display(), written, "memfd exported");
    Ok(written)
}
