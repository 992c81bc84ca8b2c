// Host environment description

use std::fmt;

pub use strata_resolver::platform::Platform;

/// Which host variant this build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Full runtime: filesystem and dynamic driver loading available
    Native,
    /// Restricted runtime (wasm32): driver resolution always fails
    Wasm,
}

impl HostKind {
    pub const fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            HostKind::Wasm
        } else {
            HostKind::Native
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostKind::Native => "native",
            HostKind::Wasm => "wasm",
        }
    }

    pub fn supports_dynamic_loading(&self) -> bool {
        matches!(self, HostKind::Native)
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
