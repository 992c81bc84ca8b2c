// Host platform as it appears in driver directory names ("linux-x64")

use std::env::consts;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform this binary was compiled for
    pub fn detect() -> Self {
        Self::new(consts::OS, arch_label(consts::ARCH))
    }

    /// Directory name for platform-specific drivers ("linux-x64")
    pub fn to_target_string(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

/// Short architecture labels used by driver packages
fn arch_label(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Human-readable form: "Linux x86-64", "macOS ARM64"
impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self.os.as_str() {
            "linux" => "Linux",
            "macos" => "macOS",
            "windows" => "Windows",
            "freebsd" => "FreeBSD",
            other => other,
        };
        let arch = match self.arch.as_str() {
            "x64" => "x86-64",
            "ia32" => "x86",
            "arm64" => "ARM64",
            "wasm" => "WebAssembly",
            other => other,
        };
        write!(f, "{} {}", os, arch)
    }
}
