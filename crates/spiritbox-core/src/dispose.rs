//! Dispose: release a memfd handle

use crate::{ContainmentError, Result};
use std::os::unix::io::RawFd;

/// Close `fd`.
///
/// Negative values are rejected with `InvalidArgument`. A failing close
/// (for instance `EBADF` after the handle was already released) is reported
/// as `CloseFailed`. Validity is not tracked here: after a successful call
/// the value must not be used again.
pub fn close_fd(fd: RawFd) -> Result<()> {
    if fd < 0 {
        return Err(ContainmentError::invalid(format!("handle {fd} is negative")));
    }

    nix::unistd::close(fd).map_err(|source| ContainmentError::CloseFailed { fd, source })?;
    tracing::debug!(fd, "memfd handle released");
    Ok(())
}
