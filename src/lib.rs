//!A thin adapter over the system dynamic loader, used to load native extensions into a running program.
//!
//!The crate has two layers:
//!1. A raw adapter ([`adapter`]) mapping one-to-one onto `dlopen`, `dlsym`, `dlclose` and `dlerror`.
//!   Failures are reported through a `None` return plus [`adapter::get_error`], exactly like the loader does.
//!2. A safe layer ([`Library`], [`Extension`], [`SnapshotSymbols`]) that turns those into `Result`s and
//!   unloads on drop.
//!
//! # Examples
//! ```no_run
//! use extension_loader::Library;
//! let lib = Library::open("./target/release/libexample.so").unwrap();
//! let add = unsafe {
//!     lib.get::<extern "C" fn(i32, i32) -> i32>("add")
//!         .unwrap()
//! };
//! println!("{}", add(1, 1));
//! ```
pub mod adapter;
mod extension;
mod flags;
mod library;
mod snapshot;

use core::fmt::Display;

pub use adapter::LibraryHandle;
pub use extension::{init_symbol_name, library_file_name, Extension};
pub use flags::OpenFlags;
pub use library::{Library, Symbol};
pub use snapshot::{
    SnapshotSymbols, ISOLATE_SNAPSHOT_DATA_SYMBOL, ISOLATE_SNAPSHOT_INSTRUCTIONS_SYMBOL,
    VM_SNAPSHOT_DATA_SYMBOL, VM_SNAPSHOT_INSTRUCTIONS_SYMBOL,
};

cfg_if::cfg_if! {
    if #[cfg(not(unix))] {
        compile_error!("unsupport os: the system dynamic loader is only available on unix");
    }
}

#[derive(Debug)]
pub enum Error {
    /// The loader could not open the library.
    LoadLibraryError {
        msg: String,
    },
    /// The symbol is absent from the library.
    FindSymbolError {
        msg: String,
    },
    /// The symbol exists but its address is null, so it can not be used as a typed value.
    NullSymbolError {
        name: String,
    },
    /// A diagnostic read straight from the loader's error slot.
    LoaderError {
        msg: String,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::LoadLibraryError { msg } => write!(f, "{msg}"),
            Error::FindSymbolError { msg } => write!(f, "{msg}"),
            Error::NullSymbolError { name } => write!(f, "symbol [{name}] resolves to null"),
            Error::LoaderError { msg } => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cold]
#[inline(never)]
fn load_library_error(msg: impl ToString) -> Error {
    Error::LoadLibraryError {
        msg: msg.to_string(),
    }
}

#[cold]
#[inline(never)]
fn find_symbol_error(msg: impl ToString) -> Error {
    Error::FindSymbolError {
        msg: msg.to_string(),
    }
}

#[cold]
#[inline(never)]
fn null_symbol_error(name: impl ToString) -> Error {
    Error::NullSymbolError {
        name: name.to_string(),
    }
}

#[cold]
#[inline(never)]
fn loader_error(msg: impl ToString) -> Error {
    Error::LoaderError {
        msg: msg.to_string(),
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_message() {
        let err = load_library_error("libmissing.so: cannot open shared object file");
        assert_eq!(
            err.to_string(),
            "libmissing.so: cannot open shared object file"
        );
        let err = null_symbol_error("weak_hook");
        assert_eq!(err.to_string(), "symbol [weak_hook] resolves to null");
    }

    #[test]
    fn loader_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(loader_error("undefined symbol: foo"));
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "undefined symbol: foo");
    }
}
