//!An example extension library.
//!
//! This crate creates a dynamic library that can be used for testing purposes.
#![allow(non_upper_case_globals)]

use std::sync::atomic::{AtomicI32, Ordering};

static INIT_CALLS: AtomicI32 = AtomicI32::new(0);

#[no_mangle]
pub extern "C" fn example_Init() -> i32 {
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);
    0
}

#[no_mangle]
pub extern "C" fn init_calls() -> i32 {
    INIT_CALLS.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn add(a: i32, b: i32) -> i32 {
    a + b
}

#[no_mangle]
pub fn print(str: &str) {
    println!("{}", str);
}

#[no_mangle]
pub static HELLO: &str = "Hello!";

#[no_mangle]
pub static _kDartVmSnapshotData: [u8; 4] = *b"vmdt";

#[no_mangle]
pub static _kDartVmSnapshotInstructions: [u8; 4] = *b"vmin";

#[no_mangle]
pub static _kDartIsolateSnapshotData: [u8; 4] = *b"isdt";

#[no_mangle]
pub static _kDartIsolateSnapshotInstructions: [u8; 4] = *b"isin";
