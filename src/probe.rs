//! Filesystem probing for unix socket destinations

use std::io;
use std::path::Path;

/// What a stat call found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A unix domain socket
    Socket,
    /// Anything else (regular file, directory, device, ...)
    Other,
}

/// Stat capability used when validating `unix://` destinations.
///
/// Errors must keep their `io::ErrorKind` so callers can tell `NotFound`
/// and `PermissionDenied` apart from real failures.
pub trait PathProbe {
    fn stat(&self, path: &Path) -> io::Result<PathKind>;
}

/// Probe backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProbe;

impl PathProbe for OsProbe {
    fn stat(&self, path: &Path) -> io::Result<PathKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(kind_of(&metadata.file_type()))
    }
}

#[cfg(unix)]
fn kind_of(file_type: &std::fs::FileType) -> PathKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_socket() {
        PathKind::Socket
    } else {
        PathKind::Other
    }
}

#[cfg(not(unix))]
fn kind_of(_file_type: &std::fs::FileType) -> PathKind {
    PathKind::Other
}
