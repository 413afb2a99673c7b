//! C FFI bindings for spiritbox
//!
//! This crate exposes the isolate/export/dispose lifecycle as a C ABI.
//!
//! # Example (C)
//! ```c
//! #include <spiritbox.h>
//!
//! IsolationResult r = isolate_file("/tmp/sample.bin", "capture");
//! if (!r.success) {
//!     fprintf(stderr, "%s\n", r.message);
//!     return 1;
//! }
//! if (export_fd(r.fd, "/tmp/sample.frozen") != 0) {
//!     fprintf(stderr, "%s\n", spiritbox_last_error());
//! }
//! close_fd(r.fd);
//! ```
//!
//! # Status codes
//! `export_fd` and `close_fd` return `0` on success and a negative code on
//! failure: `-1` invalid argument, `-2` resource creation failed, `-3` source
//! unreadable, `-4` bad handle, `-5` read failed, `-6` write failed, `-7` flush
//! failed, `-8` seal failed, `-9` destination unwritable, `-10` permission
//! change failed, `-11` close failed.

#![allow(clippy::missing_safety_doc)]

use libc::{c_char, c_int};
use once_cell::sync::Lazy;
use spiritbox_core::{ContainmentError, INVALID_FD};
use std::cell::RefCell;
use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::IntoRawFd;
use std::path::Path;
use std::ptr;

/// Capacity of [`IsolationResult::message`], including the trailing NUL
pub const MESSAGE_CAPACITY: usize = 256;

/// Outcome of `isolate_file`
#[repr(C)]
pub struct IsolationResult {
    /// 1 on success, 0 on failure
    pub success: c_int,
    /// Sealed memfd on success, -1 on failure
    pub fd: c_int,
    /// Bytes copied
    pub size: u64,
    /// NUL-terminated diagnostic, empty on success
    pub message: [c_char; MESSAGE_CAPACITY],
}

impl IsolationResult {
    fn failure(msg: &str) -> Self {
        set_last_error(msg);
        let mut result = Self {
            success: 0,
            fd: INVALID_FD,
            size: 0,
            message: [0; MESSAGE_CAPACITY],
        };
        write_message(&mut result.message, msg);
        result
    }
}

fn write_message(buf: &mut [c_char; MESSAGE_CAPACITY], msg: &str) {
    let bytes = msg.as_bytes();
    let len = bytes.len().min(MESSAGE_CAPACITY - 1);
    for (slot, byte) in buf.iter_mut().zip(&bytes[..len]) {
        *slot = *byte as c_char;
    }
    buf[len] = 0;
}

// Message of the most recent failing call on this thread; cleared on success
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    let msg = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn status_of(result: spiritbox_core::Result<()>) -> c_int {
    match result {
        Ok(()) => {
            clear_last_error();
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            e.kind().status()
        }
    }
}

/// Borrow a C string as a path; NULL yields None
unsafe fn path_arg<'a>(raw: *const c_char) -> Option<&'a Path> {
    if raw.is_null() {
        return None;
    }
    // SAFETY: caller guarantees a valid NUL-terminated string
    let bytes = unsafe { CStr::from_ptr(raw) }.to_bytes();
    Some(Path::new(OsStr::from_bytes(bytes)))
}

/// Get the message of the last failing call on this thread
///
/// Returns NULL if the last call succeeded or none was made. The string is
/// valid until the next spiritbox call on this thread.
#[unsafe(no_mangle)]
pub extern "C" fn spiritbox_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ref().map_or(ptr::null(), |msg| msg.as_ptr()))
}

/// Copy `source_path` into a sealed memfd named `label`
///
/// On success the caller owns `fd` and must release it with `close_fd()`.
/// On failure `fd` is -1 and nothing is left open.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isolate_file(
    source_path: *const c_char,
    label: *const c_char,
) -> IsolationResult {
    // SAFETY: caller guarantees source_path is NULL or a valid C string
    let Some(source) = (unsafe { path_arg(source_path) }) else {
        return IsolationResult::failure("invalid argument: source_path is null");
    };

    if label.is_null() {
        return IsolationResult::failure("invalid argument: label is null");
    }

    // SAFETY: caller guarantees label is a valid C string
    let Ok(label) = unsafe { CStr::from_ptr(label) }.to_str() else {
        return IsolationResult::failure("invalid argument: label is not valid UTF-8");
    };

    match spiritbox_core::isolate_file(source, label) {
        Ok(isolation) => {
            clear_last_error();
            IsolationResult {
                success: 1,
                fd: isolation.handle.into_raw_fd(),
                size: isolation.size,
                message: [0; MESSAGE_CAPACITY],
            }
        }
        Err(e) => IsolationResult::failure(&e.to_string()),
    }
}

/// Write the content of `fd` to `destination_path` and make it read-only
///
/// Returns 0 on success or a negative status code. `fd` stays open.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn export_fd(fd: c_int, destination_path: *const c_char) -> c_int {
    // SAFETY: caller guarantees destination_path is NULL or a valid C string
    let Some(destination) = (unsafe { path_arg(destination_path) }) else {
        return status_of(Err(ContainmentError::InvalidArgument(
            "destination_path is null".into(),
        )));
    };

    status_of(spiritbox_core::export_fd(fd, destination).map(|_| ()))
}

/// Release `fd`
///
/// Returns 0 on success or a negative status code; closing an already
/// released handle fails.
#[unsafe(no_mangle)]
pub extern "C" fn close_fd(fd: c_int) -> c_int {
    status_of(spiritbox_core::close_fd(fd))
}

/// Get library version
#[unsafe(no_mangle)]
pub extern "C" fn spiritbox_version() -> *const c_char {
    static VERSION: Lazy<CString> =
        Lazy::new(|| CString::new(env!("CARGO_PKG_VERSION")).unwrap_or_default());
    VERSION.as_ptr()
}
