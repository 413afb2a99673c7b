//! Generates `include/spiritbox.h` from the exported C ABI

use std::path::PathBuf;

fn main() {
    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let include_dir = crate_dir.join("../../include");
    std::fs::create_dir_all(&include_dir)
        .unwrap_or_else(|e| panic!("cannot create {}: {e}", include_dir.display()));

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("cbindgen.toml must parse");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
        .expect("C bindings generate")
        .write_to_file(include_dir.join("spiritbox.h"));

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");
}
