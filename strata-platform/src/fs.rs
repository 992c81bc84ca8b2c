// Filesystem utilities
// Host errors are returned as-is; nothing is wrapped or retried.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

pub fn exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

pub fn read_sync<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    fs::read(path)
}

pub fn read_to_string<P: AsRef<Path>>(path: P) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Append `bytes` to `path`, creating the file if needed
pub fn append_sync<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)
}

/// Replace the contents of `path`. Completion is the returned future resolving.
pub async fn write_async<P, C>(path: P, bytes: C) -> io::Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    tokio::fs::write(path, bytes).await
}
