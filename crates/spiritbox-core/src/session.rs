//! Caller-side bookkeeping for several captures
//!
//! The ingest/export/dispose operations keep no state of their own. A
//! `ContainmentSession` is one way for a caller to account for the handles
//! it owns: every capture it creates is released by [`ContainmentSession::teardown`].

use crate::{isolate_file_with, ContainmentConfig, ContainmentError, Result, SealedFd};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// A file isolated through a session
#[derive(Debug)]
pub struct Capture {
    source: PathBuf,
    handle: SealedFd,
    size: u64,
}

impl Capture {
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub const fn handle(&self) -> &SealedFd {
        &self.handle
    }

    #[must_use]
    pub fn proc_path(&self) -> PathBuf {
        self.handle.proc_path()
    }

    pub fn export(&self, destination: &Path) -> Result<u64> {
        self.handle.export(destination)
    }
}

/// Owns a set of captures until they are torn down
#[derive(Debug)]
pub struct ContainmentSession {
    config: ContainmentConfig,
    captures: Vec<Capture>,
}

impl ContainmentSession {
    #[must_use]
    pub const fn new(config: ContainmentConfig) -> Self {
        Self {
            config,
            captures: Vec::new(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.config.label
    }

    #[must_use]
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Isolate `source` and keep the capture in this session
    pub fn isolate(&mut self, source: &Path) -> Result<&Capture> {
        if !source.exists() {
            return Err(ContainmentError::SourceUnreadable {
                path: source.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }

        let isolation = isolate_file_with(source, &self.config.label, &self.config)?;
        tracing::debug!(
            session = %self.config.label,
            captures = self.captures.len() + 1,
            "capture added to session"
        );

        self.captures.push(Capture {
            source: source.to_path_buf(),
            handle: isolation.handle,
            size: isolation.size,
        });
        Ok(&self.captures[self.captures.len() - 1])
    }

    /// Export capture `index` using this session's settings
    pub fn export(&self, index: usize, destination: &Path) -> Result<u64> {
        let capture = self.captures.get(index).ok_or_else(|| {
            ContainmentError::InvalidArgument(format!(
                "capture {index} out of range ({} captures)",
                self.captures.len()
            ))
        })?;
        crate::export_fd_with(capture.handle.as_raw_fd(), destination, &self.config)
    }

    /// Dispose of every capture.
    ///
    /// All handles are attempted even if some fail. Returns the number
    /// released, or the first failure.
    pub fn teardown(&mut self) -> Result<usize> {
        let mut released = 0;
        let mut first_error = None;

        for capture in self.captures.drain(..) {
            let fd = capture.handle.as_raw_fd();
            match capture.handle.dispose() {
                Ok(()) => released += 1,
                Err(e) => {
                    tracing::warn!(fd, source = %capture.source.display(), "failed to release capture: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        tracing::info!(session = %self.config.label, released, "session torn down");
        first_error.map_or(Ok(released), Err)
    }
}

impl Drop for ContainmentSession {
    fn drop(&mut self) {
        if !self.captures.is_empty() {
            tracing::warn!(
                session = %self.config.label,
                captures = self.captures.len(),
                "session dropped without teardown; handles left open"
            );
        }
    }
}
