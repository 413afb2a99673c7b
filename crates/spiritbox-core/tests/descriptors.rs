//! Descriptor accounting.
//!
//! Kept as a single test in its own binary: nothing else in the process
//! opens or closes descriptors while the counts are taken, and a released
//! descriptor number cannot be reused by a concurrent test.

use spiritbox_core::{close_fd, isolate_file, ErrorKind};
use std::os::unix::io::IntoRawFd;

fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn descriptor_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let directory = dir.path().to_path_buf();
    let fifo = dir.path().join("pipe");
    nix::unistd::mkfifo(fifo.as_path(), nix::sys::stat::Mode::from_bits_truncate(0o600)).unwrap();
    let source = dir.path().join("source.txt");
    std::fs::write(&source, b"counted").unwrap();

    // Failed ingests leave nothing open
    let before = open_descriptors();
    for _ in 0..8 {
        let err = isolate_file(&missing, "leak_check").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnreadable);
        let err = isolate_file(&directory, "leak_check").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnreadable);
        let err = isolate_file(&fifo, "leak_check").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnreadable);
    }
    assert_eq!(open_descriptors(), before);

    // Successful ingest holds exactly one descriptor until disposed
    let isolation = isolate_file(&source, "lifecycle").unwrap();
    assert_eq!(open_descriptors(), before + 1);

    let export = dir.path().join("export.txt");
    isolation.handle.export(&export).unwrap();
    assert_eq!(open_descriptors(), before + 1);

    let fd = isolation.handle.into_raw_fd();
    close_fd(fd).unwrap();
    assert_eq!(open_descriptors(), before);

    // A second dispose of the same value is reported
    let err = close_fd(fd).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CloseFailed);
    assert_eq!(err.raw_os_error(), Some(nix::libc::EBADF));
}
