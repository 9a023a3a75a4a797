// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the image sorter

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for sorter operations
pub type Result<T> = std::result::Result<T, SorterError>;

/// Image sorter error types
#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    #[error("Path encoding error: {0}")]
    Decode(String),

    #[error("Image paths and labels differ in length ({paths} paths, {labels} labels)")]
    LengthMismatch { paths: usize, labels: usize },

    #[error("Invalid label: {0:?}")]
    InvalidLabel(String),

    #[error("Restore target already exists: {}", .0.display())]
    RestoreConflict(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SorterError {
    /// Classify an I/O error raised while operating on `path`
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.to_path_buf()),
            io::ErrorKind::InvalidInput => {
                Self::Decode(format!("{}: {}", path.display(), err))
            }
            _ => Self::FileSystem(err),
        }
    }
}
