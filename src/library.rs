use crate::{
    adapter::{self, LibraryHandle},
    find_symbol_error, load_library_error, null_symbol_error, OpenFlags, Result,
};
use core::{
    ffi::c_void,
    fmt::Debug,
    marker::PhantomData,
    mem::ManuallyDrop,
    ops,
    ptr::null_mut,
};
use spin::Mutex;
use std::{cell::Cell, ffi::OsStr};

// Held across every clear/operate/read-error sequence, so diagnostics are never mixed up.
static LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static HOLDS_LOCK: Cell<bool> = const { Cell::new(false) };
}

struct Held;

impl Drop for Held {
    fn drop(&mut self) {
        HOLDS_LOCK.with(|held| held.set(false));
    }
}

/// Run `f` under [`LOCK`].
///
/// `dlopen` and `dlclose` run library constructors and destructors on the calling thread, and those
/// may come back here (open a library, drop one). The thread that already holds the lock runs `f`
/// directly instead of spinning on itself.
fn with_loader_lock<R>(f: impl FnOnce() -> R) -> R {
    if HOLDS_LOCK.with(Cell::get) {
        return f();
    }
    let _lock = LOCK.lock();
    HOLDS_LOCK.with(|held| held.set(true));
    let _held = Held;
    f()
}

/// A library loaded by the system loader. It is unloaded when dropped.
pub struct Library {
    handle: LibraryHandle,
    name: String,
}

impl Debug for Library {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

impl Library {
    /// Load a shared library from a specified path
    ///
    /// Lazy binding is used, see [`OpenFlags::default`].
    ///
    /// # Example
    /// ```no_run
    /// use extension_loader::Library;
    ///
    /// let lib = Library::open("/path/to/library.so").expect("Failed to load library");
    /// ```
    pub fn open(path: impl AsRef<OsStr>) -> Result<Library> {
        Self::open_with_flags(path, OpenFlags::default())
    }

    /// Load a shared library from a specified path with explicit `flags`.
    ///
    /// The library's constructors run inside this call, on this thread. They may use `Library`
    /// themselves; other threads wait until the load has finished.
    pub fn open_with_flags(path: impl AsRef<OsStr>, flags: OpenFlags) -> Result<Library> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let (handle, err) = with_loader_lock(|| {
            let handle = adapter::load_extension_library_with(path, flags);
            (handle, adapter::get_error())
        });
        match handle {
            Some(handle) => Ok(Library { handle, name }),
            None => Err(load_library_error(match err {
                Some(err) => err.to_string(),
                None => format!("{name}: load fail"),
            })),
        }
    }

    /// Open the running program. Lookups see the program and every library loaded with global scope.
    pub fn this() -> Result<Library> {
        let name = std::env::current_exe()
            .map(|exe| exe.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (handle, err) = with_loader_lock(|| {
            let handle = adapter::load_process_handle();
            (handle, adapter::get_error())
        });
        match handle {
            Some(handle) => Ok(Library { handle, name }),
            None => Err(load_library_error(match err {
                Some(err) => err.to_string(),
                None => format!("{name}: load fail"),
            })),
        }
    }

    /// Retrieves the name of the library, which is the path it was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> LibraryHandle {
        self.handle
    }

    /// Get the raw address of a symbol.
    ///
    /// Unlike [`Library::get`], a symbol whose address is null is returned as a null pointer rather
    /// than as an error.
    pub fn get_raw(&self, name: &str) -> Result<*mut c_void> {
        let (sym, err) = with_loader_lock(|| {
            let sym = unsafe { adapter::resolve_symbol(self.handle, name) };
            (sym, sym.is_none().then(adapter::get_error).flatten())
        });
        match (sym, err) {
            (Some(sym), _) => Ok(sym.as_ptr()),
            (None, Some(err)) => Err(find_symbol_error(err)),
            (None, None) => Ok(null_mut()),
        }
    }

    /// Get a pointer to a function or static variable by symbol name.
    ///
    /// The symbol is interpreted as-is; no mangling is done.
    ///
    /// # Safety
    ///
    /// Users of this API must specify the correct type of the function or variable loaded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use extension_loader::{Library, Symbol};
    /// let lib = Library::open("/path/to/awesome.module").unwrap();
    /// unsafe {
    ///     let awesome_function: Symbol<unsafe extern "C" fn(f64) -> f64> =
    ///         lib.get("awesome_function").unwrap();
    ///     awesome_function(0.42);
    /// }
    /// ```
    ///
    /// A static variable may also be loaded and inspected:
    ///
    /// ```no_run
    /// # use extension_loader::{Library, Symbol};
    /// # let lib = Library::open("/path/to/awesome.module").unwrap();
    /// unsafe {
    ///     let awesome_variable: Symbol<*mut f64> = lib.get("awesome_variable").unwrap();
    ///     **awesome_variable = 42.0;
    /// };
    /// ```
    pub unsafe fn get<'lib, T>(&'lib self, name: &str) -> Result<Symbol<'lib, T>> {
        let ptr = self.get_raw(name)?;
        if ptr.is_null() {
            return Err(null_symbol_error(name));
        }
        log::debug!("get: Found symbol [{}] in [{}] at {:p}", name, self.name, ptr);
        Ok(Symbol::from_raw(ptr.cast()))
    }

    /// Unload the library now instead of at drop.
    ///
    /// # Panics
    /// Panics if the system loader fails to unload it.
    pub fn close(self) {
        drop(self)
    }

    /// Give up ownership without unloading. The handle can be turned back with [`Library::from_raw`].
    pub fn into_raw(self) -> LibraryHandle {
        let this = ManuallyDrop::new(self);
        this.handle
    }

    /// Take ownership of a handle returned by the `dlopen` family.
    ///
    /// # Safety
    ///
    /// The handle must come from a successful load, must not be unloaded elsewhere, and must not be
    /// owned by another `Library`.
    pub unsafe fn from_raw(handle: LibraryHandle, name: impl Into<String>) -> Library {
        Library {
            handle,
            name: name.into(),
        }
    }
}

/// Unloads through the system loader, running the library's destructors on this thread.
///
/// # Panics
/// Panics if the system loader fails to unload the library.
impl Drop for Library {
    fn drop(&mut self) {
        log::info!("close: Closing [{}]", self.name);
        with_loader_lock(|| unsafe { adapter::unload_library(self.handle) });
    }
}

/// A symbol resolved from a [`Library`]. It can not outlive the library.
#[derive(Debug, Clone)]
pub struct Symbol<'lib, T: 'lib> {
    ptr: *mut (),
    pd: PhantomData<&'lib T>,
}

impl<'lib, T> Symbol<'lib, T> {
    pub(crate) unsafe fn from_raw(ptr: *mut ()) -> Symbol<'lib, T> {
        Symbol {
            ptr,
            pd: PhantomData,
        }
    }

    pub fn into_raw(self) -> *const () {
        self.ptr
    }
}

impl<'lib, T> ops::Deref for Symbol<'lib, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*(&self.ptr as *const *mut _ as *const T) }
    }
}
