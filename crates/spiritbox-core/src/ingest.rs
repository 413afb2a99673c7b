//! Ingest: copy a file into a memfd and seal it

use crate::copy::{copy_chunks, CopyError};
use crate::handle::{required_seals, SealedFd};
use crate::{ContainmentConfig, ContainmentError, Isolation, Result};
use memfd::MemfdOptions;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::Path;

/// Isolate `source` into a sealed memfd named `label`, using default settings.
///
/// See [`isolate_file_with`].
pub fn isolate_file(source: &Path, label: &str) -> Result<Isolation> {
    isolate_file_with(source, label, &ContainmentConfig::default())
}

/// Isolate `source` into a sealed memfd named `label`.
///
/// The memfd is created close-on-exec and seal-capable, filled with an
/// exact copy of `source`, then sealed against writes, shrinking, growing
/// and further sealing. On success the caller owns the returned handle and
/// must eventually [`dispose`](SealedFd::dispose) it. On failure nothing
/// stays open: the memfd is closed before the error is returned.
///
/// `label` is only a diagnostic name for the memfd; it carries no access
/// control meaning.
pub fn isolate_file_with(source: &Path, label: &str, config: &ContainmentConfig) -> Result<Isolation> {
    validate(source, label, config)?;

    tracing::debug!(source = %source.display(), label, "creating memfd");
    let memfd = MemfdOptions::default()
        .allow_sealing(true)
        .close_on_exec(true)
        .create(label)
        .map_err(ContainmentError::ResourceCreationFailed)?;

    let mut input = open_source(source)?;

    let mut sink = memfd.as_file();
    let size = copy_chunks(&mut input, &mut sink, config.chunk_size).map_err(|e| match e {
        CopyError::Read(e) => ContainmentError::ReadFailed(e),
        CopyError::Write(e) => ContainmentError::WriteFailed(e),
    })?;
    tracing::debug!(size, "source copied into memfd");

    memfd
        .add_seals(&required_seals())
        .map_err(ContainmentError::SealFailed)?;

    let handle = SealedFd::from_owned(OwnedFd::from(memfd.into_file()));
    tracing::info!(
        source = %source.display(),
        fd = handle.as_raw_fd(),
        size,
        "file isolated in sealed memfd"
    );

    Ok(Isolation { handle, size })
}

fn validate(source: &Path, label: &str, config: &ContainmentConfig) -> Result<()> {
    if source.as_os_str().is_empty() {
        return Err(ContainmentError::invalid("source path is empty"));
    }
    if label.is_empty() {
        return Err(ContainmentError::invalid("label is empty"));
    }
    if label.contains('\0') {
        return Err(ContainmentError::invalid("label contains a NUL byte"));
    }
    if config.chunk_size == 0 {
        return Err(ContainmentError::invalid("chunk size is zero"));
    }
    Ok(())
}

fn open_source(source: &Path) -> Result<File> {
    let unreadable = |e| ContainmentError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    };

    // O_NONBLOCK keeps a FIFO with no writer from blocking the open; it has
    // no effect on regular files.
    let file = OpenOptions::new()
        .read(true)
        .custom_flags(nix::libc::O_NONBLOCK)
        .open(source)
        .map_err(unreadable)?;
    let metadata = file.metadata().map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    Ok(file)
}
