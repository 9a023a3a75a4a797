// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Listing of sortable images in a folder

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::paths::{display_path, PathResolver};
use crate::{Result, SorterError};

/// Image extensions the sorter handles, compared case-insensitively
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Check if a path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// An image found in a listed folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub path: String,
    pub filename: String,
}

/// Enumerates supported images in a single directory level
#[derive(Debug, Clone)]
pub struct FolderLister {
    resolver: PathResolver,
}

impl FolderLister {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// List the supported images directly inside `folder_raw`
    pub fn list(&self, folder_raw: &str) -> Result<Vec<ImageEntry>> {
        let folder = self.resolver.resolve(folder_raw);
        debug!("Listing folder: {:?}", folder);

        let metadata = fs::metadata(&folder).map_err(|e| SorterError::from_io(e, &folder))?;
        if !metadata.is_dir() {
            return Err(SorterError::NotADirectory(folder));
        }

        let entries = fs::read_dir(&folder).map_err(|e| SorterError::from_io(e, &folder))?;

        let mut images = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", folder, e);
                    continue;
                }
            };

            let path = entry.path();
            if path.is_file() && is_supported_image(&path) {
                images.push(ImageEntry {
                    path: display_path(&path),
                    filename: entry.file_name().to_string_lossy().into_owned(),
                });
            }
        }

        info!("Found {} images in {:?}", images.len(), folder);
        Ok(images)
    }
}
