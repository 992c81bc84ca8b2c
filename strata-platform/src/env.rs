// Environment loading (dotenv files and process variables)

use std::path::Path;

/// Load `KEY=value` pairs from `path` into the process environment.
/// Variables that are already set keep their current value.
pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<(), dotenvy::Error> {
    dotenvy::from_path(path.as_ref())
}

/// Like [`load_env_file`], but file values replace existing variables
pub fn load_env_file_override<P: AsRef<Path>>(path: P) -> Result<(), dotenvy::Error> {
    dotenvy::from_path_override(path.as_ref())
}

/// Parse `path` without touching the process environment
pub fn read_env_file<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>, dotenvy::Error> {
    dotenvy::from_path_iter(path.as_ref())?.collect()
}

/// Value of `name`; unset and non-unicode values are both `None`
pub fn get_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
