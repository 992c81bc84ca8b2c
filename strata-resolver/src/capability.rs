// Capability names requested by callers

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityNameError {
    #[error("capability name cannot be empty")]
    Empty,
}

/// Logical identifier of an optional driver (e.g. `"pg"`, `"@sap/hana-client"`).
///
/// The only structural rule is that the name is not blank. Uniqueness is a
/// property of the resolution table, not of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityName(String);

impl CapabilityName {
    pub fn new(name: impl Into<String>) -> Result<Self, CapabilityNameError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CapabilityNameError::Empty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CapabilityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CapabilityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for CapabilityName {
    type Err = CapabilityNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for CapabilityName {
    type Error = CapabilityNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for CapabilityName {
    type Error = CapabilityNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
