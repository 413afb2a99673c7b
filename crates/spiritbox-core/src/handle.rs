//! Owned handle to a sealed memfd

use crate::{ContainmentError, Result};
use memfd::{FileSeal, Memfd};
use std::collections::HashSet;
use std::fs::File;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

/// Sentinel for "no handle"
pub const INVALID_FD: RawFd = -1;

/// Set of seals present on a memfd
pub type SealSet = HashSet<FileSeal>;

/// Seals applied by ingest: no writes, no shrinking, no growing, no further seal changes
pub const REQUIRED_SEALS: [FileSeal; 4] = [
    FileSeal::SealWrite,
    FileSeal::SealShrink,
    FileSeal::SealGrow,
    FileSeal::SealSeal,
];

pub(crate) fn required_seals() -> SealSet {
    REQUIRED_SEALS.into_iter().collect()
}

pub(crate) fn proc_fd_path(fd: RawFd) -> PathBuf {
    PathBuf::from(format!("/proc/self/fd/{fd}"))
}

/// An open, sealed anonymous memory file.
///
/// Ingest hands one of these to the caller; export borrows it and
/// [`SealedFd::dispose`] consumes it. There is no `Drop` impl: a handle that
/// is never disposed stays open until the process exits, and a failed close
/// is always returned to the caller.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a sealed handle stays open until `dispose` is called"]
pub struct SealedFd {
    fd: RawFd,
}

impl SealedFd {
    pub(crate) fn from_owned(fd: OwnedFd) -> Self {
        Self {
            fd: fd.into_raw_fd(),
        }
    }

    /// `/proc/self/fd/<n>`, openable read-only by code in this process
    #[must_use]
    pub fn proc_path(&self) -> PathBuf {
        proc_fd_path(self.fd)
    }

    /// Write the sealed content to `destination`, see [`crate::export_fd`]
    pub fn export(&self, destination: &Path) -> Result<u64> {
        crate::export_fd(self.fd, destination)
    }

    /// Seals currently present on the object
    pub fn seals(&self) -> Result<SealSet> {
        let bad_handle = |source| ContainmentError::BadHandle {
            fd: self.fd,
            source,
        };

        let dup = self.as_fd().try_clone_to_owned().map_err(bad_handle)?;
        let memfd = Memfd::try_from_fd(File::from(dup)).map_err(|_| {
            bad_handle(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "descriptor is not a memfd",
            ))
        })?;

        memfd
            .seals()
            .map_err(|e| bad_handle(std::io::Error::other(e.to_string())))
    }

    /// Whether every seal in [`REQUIRED_SEALS`] is in place
    pub fn is_sealed(&self) -> Result<bool> {
        let seals = self.seals()?;
        Ok(REQUIRED_SEALS.iter().all(|seal| seals.contains(seal)))
    }

    /// Release the handle, see [`crate::close_fd`]
    pub fn dispose(self) -> Result<()> {
        crate::close_fd(self.into_raw_fd())
    }
}

impl AsRawFd for SealedFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl AsFd for SealedFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the descriptor stays open for as long as `self` exists;
        // only `dispose`/`into_raw_fd` give up ownership and both consume self.
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }
}

impl IntoRawFd for SealedFd {
    fn into_raw_fd(self) -> RawFd {
        self.fd
    }
}

impl FromRawFd for SealedFd {
    /// # Safety
    /// `fd` must be an open descriptor owned by the caller; ownership moves
    /// into the returned handle.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self { fd }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proc_path_names_descriptor() {
        assert_eq!(proc_fd_path(12), PathBuf::from("/proc/self/fd/12"));
    }

    #[test]
    fn required_seals_cover_all_mutations() {
        let seals = required_seals();
        assert_eq!(seals.len(), 4);
        assert!(seals.contains(&FileSeal::SealSeal));
        assert!(seals.contains(&FileSeal::SealWrite));
    }

    #[test]
    fn device_is_not_a_memfd() {
        let file = File::open("/dev/null").unwrap();
        let handle = SealedFd::from_owned(OwnedFd::from(file));

        let err = handle.seals().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::BadHandle);

        handle.dispose().unwrap();
    }

    #[test]
    fn unsealed_memfd_reports_not_sealed() {
        let memfd = memfd::MemfdOptions::default()
            .allow_sealing(true)
            .create("unsealed")
            .unwrap();
        let handle = SealedFd::from_owned(OwnedFd::from(memfd.into_file()));

        assert!(!handle.is_sealed().unwrap());

        handle.dispose().unwrap();
    }
}
