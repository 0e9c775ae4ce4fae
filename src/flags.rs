use bitflags::bitflags;
use core::ffi::c_int;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Mode bits passed to the system loader when opening a library.
    pub struct OpenFlags: c_int {
        /// Resolve function symbols on first call.
        const RTLD_LAZY = libc::RTLD_LAZY;
        /// Resolve all undefined symbols before `dlopen` returns.
        const RTLD_NOW = libc::RTLD_NOW;
        /// Make the library's symbols available to libraries loaded later.
        const RTLD_GLOBAL = libc::RTLD_GLOBAL;
        /// Keep the library's symbols out of the global scope.
        const RTLD_LOCAL = libc::RTLD_LOCAL;
        /// Do not unmap the library on `dlclose`.
        const RTLD_NODELETE = libc::RTLD_NODELETE;
        /// Only return a handle if the library is already resident.
        const RTLD_NOLOAD = libc::RTLD_NOLOAD;
    }
}

impl OpenFlags {
    #[inline]
    pub(crate) fn is_lazy(&self) -> bool {
        !self.contains(OpenFlags::RTLD_NOW)
    }
}

/// Lazy, local binding. Used by [`crate::adapter::load_extension_library`] and [`crate::Library::open`].
impl Default for OpenFlags {
    fn default() -> Self {
        OpenFlags::RTLD_LAZY | OpenFlags::RTLD_LOCAL
    }
}
