// Path utilities
// Lexical only: nothing here touches the filesystem except reading the current directory.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a path without consulting the filesystem.
///
/// `.` segments and repeated separators are dropped and `..` removes the
/// preceding segment where there is one. Leading `..` segments of a relative
/// path are kept; `..` directly under the root is discarded. Separators come
/// out in the host's native form. An empty result becomes `.`.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    let mut rooted = false;

    for component in path.as_ref().components() {
        match component {
            Component::Prefix(_) => out.push(component.as_os_str()),
            Component::RootDir => {
                rooted = true;
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !rooted {
                    out.push("..");
                }
            }
            Component::Normal(segment) => {
                out.push(segment);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Extension including the leading dot (`"query.sql"` -> `".sql"`).
///
/// Empty when there is none; dotfiles such as `.env` have no extension.
pub fn extension<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Absolute, normalized form of `path`, relative paths taken from the current directory
pub fn resolve_absolute<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(resolve_from(std::env::current_dir()?, path))
}

/// Normalized `path` taken relative to `base` (absolute paths ignore `base`)
pub fn resolve_from<B: AsRef<Path>, P: AsRef<Path>>(base: B, path: P) -> PathBuf {
    normalize(base.as_ref().join(path))
}
