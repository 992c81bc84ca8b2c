// Host-level driver loading
// Native hosts open shared libraries; restricted (wasm) hosts cannot load anything.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::capability::CapabilityName;

/// Symbol every driver library must export. A library without it is not a
/// driver and is never handed out.
pub const DRIVER_ENTRY_SYMBOL: &[u8] = b"strata_driver_entry\0";

/// Signature of [`DRIVER_ENTRY_SYMBOL`]. The returned pointer is owned by the
/// driver and its layout is agreed between the driver and its consumer.
pub type DriverEntryFn = unsafe extern "C" fn() -> *mut std::ffi::c_void;

const STEM_PREFIX: &str = "strata_";

/// Errors from a single load attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to open {target}: {message}")]
    Open { target: String, message: String },

    #[error("{target} does not export the driver entry symbol")]
    MissingEntry { target: String },

    #[error("no driver library under {root}")]
    NotFound { root: String },

    #[error("'{name}' does not name a location inside {root}")]
    OutsideRoot { name: String, root: String },

    #[error("driver root unavailable: {message}")]
    RootUnavailable { message: String },

    #[error("dynamic loading is not supported on this host")]
    Unsupported,
}

/// Where a handle was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Found by the host library search (file name only)
    Library(String),
    /// Loaded from an explicit file under the fallback root
    Path(PathBuf),
}

impl fmt::Display for LoadOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOrigin::Library(name) => write!(f, "library {}", name),
            LoadOrigin::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Performs the host-level load for a resolution step.
///
/// Implementations must not cache: every call produces a fresh handle owned
/// by the caller.
pub trait Loader {
    type Handle;

    /// Load `file_name` through the host's library search path
    fn load_library(
        &self,
        capability: &CapabilityName,
        file_name: &str,
    ) -> Result<Self::Handle, LoadError>;

    /// Load the library at `path`
    fn load_path(&self, capability: &CapabilityName, path: &Path)
        -> Result<Self::Handle, LoadError>;
}

impl<L: Loader + ?Sized> Loader for &L {
    type Handle = L::Handle;

    fn load_library(
        &self,
        capability: &CapabilityName,
        file_name: &str,
    ) -> Result<Self::Handle, LoadError> {
        (**self).load_library(capability, file_name)
    }

    fn load_path(
        &self,
        capability: &CapabilityName,
        path: &Path,
    ) -> Result<Self::Handle, LoadError> {
        (**self).load_path(capability, path)
    }
}

/// Library stem for a capability name: `"@sap/hana-client"` ->
/// `"strata_sap_hana_client"`.
pub fn library_stem(name: &str) -> String {
    let mut stem = String::from(STEM_PREFIX);
    let mut after_separator = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
            after_separator = false;
        } else if !after_separator {
            stem.push('_');
            after_separator = true;
        }
    }

    while stem.len() > STEM_PREFIX.len() && stem.ends_with('_') {
        stem.pop();
    }
    stem
}

/// Platform file name for a library stem (`libstrata_pg.so`, `strata_pg.dll`, ...)
pub fn library_file_name(stem: &str) -> String {
    format!("{}{}{}", DLL_PREFIX, stem, DLL_SUFFIX)
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::ffi::OsStr;

    use libloading::{Library, Symbol};

    /// A loaded driver library. Dropping the handle unloads this reference;
    /// other handles to the same driver stay valid.
    #[derive(Debug)]
    pub struct DriverHandle {
        capability: CapabilityName,
        origin: LoadOrigin,
        library: Library,
    }

    impl DriverHandle {
        pub fn capability(&self) -> &CapabilityName {
            &self.capability
        }

        pub fn origin(&self) -> &LoadOrigin {
            &self.origin
        }

        /// The driver's entry point
        pub fn entry(&self) -> Result<Symbol<'_, DriverEntryFn>, LoadError> {
            // SAFETY: the symbol type is fixed by the driver contract.
            unsafe { self.symbol(DRIVER_ENTRY_SYMBOL) }
        }

        /// Look up an arbitrary symbol exported by the driver.
        ///
        /// # Safety
        /// `T` must match the actual type of the exported symbol.
        pub unsafe fn symbol<T>(&self, name: &[u8]) -> Result<Symbol<'_, T>, LoadError> {
            self.library.get(name).map_err(|e| LoadError::Open {
                target: self.origin.to_string(),
                message: e.to_string(),
            })
        }

        pub fn into_library(self) -> Library {
            self.library
        }
    }

    /// Loader backed by the operating system's dynamic linker
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DylibLoader;

    impl DylibLoader {
        pub fn new() -> Self {
            Self
        }

        fn open(
            capability: &CapabilityName,
            origin: LoadOrigin,
            target: &OsStr,
        ) -> Result<DriverHandle, LoadError> {
            // SAFETY: loading runs the library's initializers; driver
            // libraries are trusted code selected by name or by the driver root.
            let library = unsafe { Library::new(target) }.map_err(|e| LoadError::Open {
                target: origin.to_string(),
                message: e.to_string(),
            })?;

            // SAFETY: presence check only, the symbol is not called.
            let has_entry = unsafe { library.get::<DriverEntryFn>(DRIVER_ENTRY_SYMBOL) }.is_ok();
            if !has_entry {
                return Err(LoadError::MissingEntry {
                    target: origin.to_string(),
                });
            }

            Ok(DriverHandle {
                capability: capability.clone(),
                origin,
                library,
            })
        }
    }

    impl Loader for DylibLoader {
        type Handle = DriverHandle;

        fn load_library(
            &self,
            capability: &CapabilityName,
            file_name: &str,
        ) -> Result<DriverHandle, LoadError> {
            Self::open(
                capability,
                LoadOrigin::Library(file_name.to_string()),
                OsStr::new(file_name),
            )
        }

        fn load_path(
            &self,
            capability: &CapabilityName,
            path: &Path,
        ) -> Result<DriverHandle, LoadError> {
            Self::open(
                capability,
                LoadOrigin::Path(path.to_path_buf()),
                path.as_os_str(),
            )
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod restricted {
    use super::*;
    use std::convert::Infallible;

    /// Restricted hosts never produce a driver handle.
    #[derive(Debug)]
    pub struct DriverHandle {
        capability: CapabilityName,
        origin: LoadOrigin,
        _never: Infallible,
    }

    impl DriverHandle {
        pub fn capability(&self) -> &CapabilityName {
            &self.capability
        }

        pub fn origin(&self) -> &LoadOrigin {
            &self.origin
        }
    }

    #[derive(Debug, Clone, Copy, Default)]
    pub struct DylibLoader;

    impl DylibLoader {
        pub fn new() -> Self {
            Self
        }
    }

    impl Loader for DylibLoader {
        type Handle = DriverHandle;

        fn load_library(&self, _: &CapabilityName, _: &str) -> Result<DriverHandle, LoadError> {
            Err(LoadError::Unsupported)
        }

        fn load_path(&self, _: &CapabilityName, _: &Path) -> Result<DriverHandle, LoadError> {
            Err(LoadError::Unsupported)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{DriverHandle, DylibLoader};
#[cfg(target_arch = "wasm32")]
pub use restricted::{DriverHandle, DylibLoader};
