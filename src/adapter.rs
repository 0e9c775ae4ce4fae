//! Raw adapter over the system dynamic loader.
//!
//! Every function here maps onto one loader primitive. Failures of [`load_extension_library`] and
//! [`resolve_symbol`] are reported the way the loader reports them: a `None` return, with the
//! diagnostic left in the error slot for [`get_error`] to pick up.
//!
//! The error slot is shared state. Reading it reliably requires that no other loader call runs
//! between the failing operation and [`get_error`]; this module does no locking of its own.
//! [`crate::Library`] wraps these calls in a lock.
use crate::{loader_error, Error, OpenFlags};
use core::{
    ffi::{c_void, CStr},
    fmt::Debug,
    ptr::{null, NonNull},
};
use std::{
    cell::RefCell,
    ffi::{CString, OsStr},
    os::unix::ffi::OsStrExt,
};

thread_local! {
    // Arguments the loader never saw (interior NUL bytes) are reported through here.
    static ARG_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// An opaque reference to a library loaded by the system loader.
///
/// The handle is only a copy of the pointer `dlopen` returned. It does not keep the library
/// alive and it is not invalidated when the library is unloaded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryHandle(NonNull<c_void>);

impl LibraryHandle {
    /// Wraps a pointer returned by the `dlopen` family. Returns `None` for null.
    #[inline]
    pub fn from_ptr(ptr: *mut c_void) -> Option<LibraryHandle> {
        NonNull::new(ptr).map(LibraryHandle)
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl Debug for LibraryHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LibraryHandle({:p})", self.0)
    }
}

// Loader handles are process-wide and the loader serializes access to them.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

/// Open the shared library at `path` with lazy binding.
///
/// Returns `None` if the loader fails; the reason is available from [`get_error`].
pub fn load_extension_library(path: impl AsRef<OsStr>) -> Option<LibraryHandle> {
    load_extension_library_with(path, OpenFlags::default())
}

/// Open the shared library at `path` with explicit `flags`.
pub fn load_extension_library_with(
    path: impl AsRef<OsStr>,
    flags: OpenFlags,
) -> Option<LibraryHandle> {
    let path = path.as_ref();
    clear_error();
    let cpath = to_cstring(path.as_bytes(), "path")?;
    let handle = unsafe { libc::dlopen(cpath.as_ptr(), flags.bits()) };
    let handle = LibraryHandle::from_ptr(handle);
    match handle {
        Some(handle) => log::info!(
            "dlopen: Loaded [{}] as {:?}, lazy binding: {}",
            path.to_string_lossy(),
            handle,
            flags.is_lazy()
        ),
        None => log::debug!("dlopen: Failed to load [{}]", path.to_string_lossy()),
    }
    handle
}

/// Open a handle to the running program itself.
///
/// Symbols are looked up in the program and, in turn, every library loaded with global scope.
pub fn load_process_handle() -> Option<LibraryHandle> {
    clear_error();
    let handle = unsafe { libc::dlopen(null(), OpenFlags::default().bits()) };
    let handle = LibraryHandle::from_ptr(handle);
    match handle {
        Some(handle) => log::info!("dlopen: Opened the running program as {:?}", handle),
        None => log::debug!("dlopen: Failed to open the running program"),
    }
    handle
}

/// Look up `symbol` in the library identified by `handle`.
///
/// The error slot is cleared first, so after a `None` return [`get_error`] tells apart a symbol that
/// is missing (an error is present) from one whose address really is null (no error).
///
/// # Safety
/// `handle` must come from a successful load and must not have been unloaded since.
pub unsafe fn resolve_symbol(handle: LibraryHandle, symbol: &str) -> Option<NonNull<c_void>> {
    clear_error();
    let name = to_cstring(symbol.as_bytes(), "symbol name")?;
    let sym = libc::dlsym(handle.as_ptr(), name.as_ptr());
    log::trace!("dlsym: [{}] in {:?} -> {:p}", symbol, handle, sym);
    NonNull::new(sym)
}

/// Unload the library identified by `handle`.
///
/// # Panics
/// Panics if the loader refuses to close the handle: callers only ever unload handles they loaded
/// and no longer use, so a failure here is a broken invariant.
///
/// # Safety
/// `handle` must come from a successful load, must not have been unloaded already, and no symbol
/// resolved through it may be used afterwards.
pub unsafe fn unload_library(handle: LibraryHandle) {
    clear_error();
    let result = libc::dlclose(handle.as_ptr());
    if result != 0 {
        let msg = take_loader_message().unwrap_or_else(|| format!("dlclose returned {result}"));
        log::error!("dlclose: Failed to unload {:?}: {}", handle, msg);
        panic!("failed to unload {handle:?}: {msg}");
    }
    log::info!("dlclose: Unloaded {:?}", handle);
}

/// Take the most recent loader diagnostic, if there is one.
///
/// Reading the diagnostic consumes it; a second call returns `None`.
pub fn get_error() -> Option<Error> {
    if let Some(msg) = ARG_ERROR.with(|slot| slot.borrow_mut().take()) {
        return Some(loader_error(msg));
    }
    take_loader_message().map(loader_error)
}

/// Discard any pending diagnostic.
pub fn clear_error() {
    ARG_ERROR.with(|slot| slot.borrow_mut().take());
    unsafe { libc::dlerror() };
}

fn take_loader_message() -> Option<String> {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned())
    }
}

fn to_cstring(bytes: &[u8], what: &str) -> Option<CString> {
    match CString::new(bytes) {
        Ok(cstr) => Some(cstr),
        Err(err) => {
            let msg = format!(
                "{}: {what} contains an interior nul byte at {}",
                String::from_utf8_lossy(bytes),
                err.nul_position()
            );
            ARG_ERROR.with(|slot| *slot.borrow_mut() = Some(msg));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_error() {
        assert!(load_extension_library("/nonexistent/libnothing-here.so").is_none());
        let err = get_error().expect("the loader should explain the failure");
        assert!(!err.to_string().is_empty());
        assert!(get_error().is_none());
    }

    #[test]
    fn nul_in_path_reports_error() {
        assert!(load_extension_library("libbad\0.so").is_none());
        let err = get_error().unwrap();
        assert!(err.to_string().contains("interior nul byte"));
    }

    #[test]
    fn process_handle_resolves_libc() {
        let handle = load_process_handle().unwrap();
        assert!(get_error().is_none());
        unsafe {
            assert!(resolve_symbol(handle, "malloc").is_some());
            assert!(get_error().is_none());
            assert!(resolve_symbol(handle, "surely_not_a_symbol_4711").is_none());
            assert!(get_error().is_some());
            unload_library(handle);
        }
        assert!(get_error().is_none());
    }

    #[test]
    fn clear_discards_pending_error() {
        assert!(load_extension_library("/nonexistent/libother.so").is_none());
        clear_error();
        assert!(get_error().is_none());
    }

    #[test]
    fn handle_rejects_null() {
        assert!(LibraryHandle::from_ptr(core::ptr::null_mut()).is_none());
    }
}
