use std::path::{Path, PathBuf};

use crate::common::error::ClientError;

pub fn absolute_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path,
        }
    }
}

/// Returns the last component of `path` as a string.
pub fn file_name(path: &Path) -> crate::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| ClientError::GenericError(format!("'{}' is not a file path", path.display())))
}

pub fn read_file(path: &Path) -> crate::Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| ClientError::FileError {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_file(path: &Path, content: &[u8]) -> crate::Result<()> {
    std::fs::write(path, content).map_err(|source| ClientError::FileError {
        path: path.to_path_buf(),
        source,
    })
}
