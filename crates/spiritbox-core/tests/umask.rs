//! Export permissions under different process umasks.
//!
//! The umask is process-wide, so this is a single test in its own binary.

use nix::sys::stat::{umask, Mode};
use spiritbox_core::{isolate_file, EXPORT_MODE};
use std::fs;
use std::os::unix::fs::PermissionsExt;

#[test]
fn export_mode_is_independent_of_umask() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.txt");
    fs::write(&source, b"umask independent").unwrap();
    let isolation = isolate_file(&source, "umask").unwrap();

    let previous = umask(Mode::from_bits_truncate(0o022));
    for (i, mask) in [0o777, 0o022, 0o000, 0o277].into_iter().enumerate() {
        umask(Mode::from_bits_truncate(mask));
        let dest = dir.path().join(format!("export-{i}"));

        let result = isolation.handle.export(&dest);

        umask(Mode::from_bits_truncate(0o022));
        result.unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, EXPORT_MODE, "umask {mask:o}");
        assert_eq!(fs::read(&dest).unwrap(), b"umask independent");
    }
    umask(previous);

    isolation.handle.dispose().unwrap();
}
