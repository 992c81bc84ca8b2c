// strata-resolver - driver lookup by capability name
// Known capabilities load through the host library search; everything else
// (and every broken direct load) falls back to the working-directory driver root.

pub mod capability;
pub mod loader;
pub mod platform;
pub mod resolver;
pub mod table;

pub use capability::{CapabilityName, CapabilityNameError};
pub use loader::{
    library_file_name, library_stem, DriverEntryFn, DriverHandle, DylibLoader, LoadError,
    LoadOrigin, Loader, DRIVER_ENTRY_SYMBOL,
};
pub use platform::Platform;
pub use resolver::{
    Attempt, FallbackRoot, ModuleResolver, ResolutionPlan, ResolveError, Stage,
    DEFAULT_DRIVER_DIR, DRIVER_ROOT_ENV,
};
pub use table::{ResolutionAction, ResolutionTable, TableEntry, TableError};
