//! End-to-end tests for the `spiritbox` binary

use assert_cmd::Command;
use std::os::unix::fs::PermissionsExt;

fn spiritbox() -> Command {
    Command::cargo_bin("spiritbox").unwrap()
}

#[test]
fn isolate_exports_read_only_copies() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let source = dir.path().join("sample.txt");
    std::fs::write(&source, b"cli payload").unwrap();

    let output = spiritbox()
        .arg("isolate")
        .arg(&source)
        .arg("--out-dir")
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["success"], true);
    assert_eq!(report[0]["size"], 11);
    assert_eq!(report[0]["message"], "");

    let exported = out.join("sample.txt");
    assert_eq!(std::fs::read(&exported).unwrap(), b"cli payload");
    let mode = std::fs::metadata(&exported).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o444);
}

#[test]
fn same_file_names_export_to_distinct_paths() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    for (sub, body) in [("a", "first"), ("b", "second")] {
        std::fs::create_dir(dir.path().join(sub)).unwrap();
        std::fs::write(dir.path().join(sub).join("x.txt"), body).unwrap();
    }

    let output = spiritbox()
        .arg("isolate")
        .arg(dir.path().join("a/x.txt"))
        .arg(dir.path().join("b/x.txt"))
        .arg("--out-dir")
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_ne!(report[0]["exported_to"], report[1]["exported_to"]);
    assert_eq!(std::fs::read(out.join("x.txt")).unwrap(), b"first");
    assert_eq!(std::fs::read(out.join("x.txt.1")).unwrap(), b"second");
}

#[test]
fn isolate_fails_on_missing_source() {
    let dir = tempfile::tempdir().unwrap();

    let output = spiritbox()
        .arg("isolate")
        .arg(dir.path().join("missing"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["success"], false);
    assert_eq!(report[0]["fd"], -1);
}

#[test]
fn inspect_lists_seals() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("inspect.bin");
    std::fs::write(&source, [0u8; 128]).unwrap();

    let output = spiritbox()
        .args(["inspect", "--label", "inspect_test"])
        .arg(&source)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("size:   128 bytes"));
    assert!(stdout.contains("label:  inspect_test"));
    for seal in ["SealGrow", "SealSeal", "SealShrink", "SealWrite"] {
        assert!(stdout.contains(seal), "{seal} missing from {stdout}");
    }
}
