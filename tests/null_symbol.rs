//! A symbol can legitimately resolve to address zero. Only the error slot tells it apart from a
//! missing one.
#![cfg(target_os = "linux")]

use extension_loader::{
    adapter::{get_error, load_process_handle, resolve_symbol, unload_library},
    Error, Library,
};

// An absolute symbol with value 0, exported from this test binary by build.rs.
core::arch::global_asm!(".globl null_sym", ".set null_sym, 0");

#[test]
fn adapter_null_symbol_has_no_error() {
    let handle = load_process_handle().unwrap();
    unsafe {
        assert!(resolve_symbol(handle, "null_sym").is_none());
        assert!(get_error().is_none());
        assert!(resolve_symbol(handle, "null_sym_missing").is_none());
        assert!(get_error().is_some());
        unload_library(handle);
    }
}

#[test]
fn get_raw_returns_null() {
    let lib = Library::this().unwrap();
    assert!(lib.get_raw("null_sym").unwrap().is_null());
    assert!(matches!(
        lib.get_raw("null_sym_missing"),
        Err(Error::FindSymbolError { .. })
    ));
}

#[test]
fn get_refuses_typed_null() {
    let lib = Library::this().unwrap();
    let err = unsafe { lib.get::<extern "C" fn()>("null_sym").unwrap_err() };
    match err {
        Error::NullSymbolError { name } => assert_eq!(name, "null_sym"),
        other => panic!("unexpected error: {other}"),
    }
}
