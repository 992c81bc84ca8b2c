//! Strata platform facade
//!
//! Everything the database core needs from its host goes through here:
//! - driver resolution by capability name ([`load`], [`ModuleResolver`])
//! - path normalization ([`paths`])
//! - file access ([`fs`])
//! - environment and dotenv loading ([`env`])
//! - styled console output ([`console`])

pub mod config;
pub mod env;
pub mod fs;
pub mod paths;
pub mod platform;

pub use strata_diagnostics as console;
pub use strata_resolver as resolver;

pub use config::{ColorMode, Config, ConfigError, CONFIG_FILE};
pub use platform::{HostKind, Platform};
pub use strata_resolver::{
    CapabilityName, DriverHandle, FallbackRoot, ModuleResolver, ResolveError,
};

/// Resolve a driver with the default resolver (known table, working-directory
/// driver root, host dynamic linker).
///
/// # Errors
/// `ResolveError::UnresolvedCapability` when no driver can be loaded.
pub fn load(name: &str) -> Result<DriverHandle, ResolveError> {
    ModuleResolver::new().resolve(name)
}
