use crate::{library::Symbol, null_symbol_error, Library, Result};
use core::{ffi::c_void, ptr::NonNull};
use std::path::{Path, PathBuf};

cfg_if::cfg_if! {
    if #[cfg(target_vendor = "apple")] {
        const DLL_SUFFIX: &str = ".dylib";
    } else {
        const DLL_SUFFIX: &str = ".so";
    }
}

/// The platform file name of the library for extension `name`, e.g. `libfoo.so`.
pub fn library_file_name(name: &str) -> String {
    format!("lib{name}{DLL_SUFFIX}")
}

/// The entry point every extension exports, e.g. `foo_Init`.
pub fn init_symbol_name(name: &str) -> String {
    format!("{name}_Init")
}

/// A loaded extension library together with its init entry point.
#[derive(Debug)]
pub struct Extension {
    name: String,
    init: NonNull<c_void>,
    // Dropped last, `init` points into it.
    library: Library,
}

unsafe impl Send for Extension {}
unsafe impl Sync for Extension {}

impl Extension {
    /// Load extension `name` from `dir` and look up its init entry point.
    ///
    /// # Example
    /// ```no_run
    /// use extension_loader::Extension;
    ///
    /// let ext = Extension::load("./target/release", "example").unwrap();
    /// let init = unsafe { ext.init::<extern "C" fn() -> i32>() };
    /// assert_eq!(init(), 0);
    /// ```
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Extension> {
        let path: PathBuf = dir.as_ref().join(library_file_name(name));
        log::info!("Loading extension [{}] from [{}]", name, path.display());
        let library = Library::open(&path)?;
        let init_name = init_symbol_name(name);
        let init = NonNull::new(library.get_raw(&init_name)?)
            .ok_or_else(|| null_symbol_error(&init_name))?;
        Ok(Extension {
            name: name.to_owned(),
            init,
            library,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// The init entry point.
    ///
    /// # Safety
    /// `T` must match the entry point's real type.
    pub unsafe fn init<T>(&self) -> Symbol<'_, T> {
        Symbol::from_raw(self.init.as_ptr().cast())
    }

    /// Unload the extension.
    pub fn close(self) {
        self.library.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn names() {
        assert_eq!(init_symbol_name("sample"), "sample_Init");
        let file = library_file_name("sample");
        assert!(file.starts_with("libsample."));
        if cfg!(target_os = "linux") {
            assert_eq!(file, "libsample.so");
        }
    }

    #[test]
    fn missing_extension() {
        let err = Extension::load("/nonexistent", "sample").unwrap_err();
        assert!(matches!(err, Error::LoadLibraryError { .. }));
    }
}
