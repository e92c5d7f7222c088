//! Storage Layer
//!
//! Filesystem helpers shared by the firearm catalog, the save browser and the
//! world's background saves:
//! - `list_files`: directory enumeration (regular files only, sorted)
//! - `save_file`: the length-prefixed brotli snapshot format
//! - `async_ops`: fire-and-poll background save threads

pub mod async_ops;
pub mod save_file;

pub use async_ops::{save_async, PendingSave};
pub use save_file::{read_snapshot, SaveError};

use std::path::Path;
use thiserror::Error;

/// Storage error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// File or directory not found
    #[error("not found: {0}")]
    NotFound(String),
    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(e.to_string()),
            _ => StorageError::Io(e.to_string()),
        }
    }
}

/// List files in a directory
///
/// Returns filenames (not full paths) of the regular files directly inside
/// `dir`, sorted so callers get a stable order across platforms.
pub fn list_files(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut files: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    files.sort();
    Ok(files)
}
