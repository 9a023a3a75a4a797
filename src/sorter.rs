// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch operations over the lister and the move engine
//!
//! Batches are best-effort: items that cannot be moved or restored are left
//! out of the result, and only whole-batch preconditions return an error.
//! Items run in the order given, one at a time, with no rollback.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::lister::{FolderLister, ImageEntry};
use crate::mover::{validate_label, MoveEngine, MoveRecord, Outcome, RestoreRecord};
use crate::paths::{display_path, PathResolver, PlatformProfile};
use crate::{Result, SorterError};

/// Result of a classification batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub success: bool,
    pub moved_files: Vec<MoveRecord>,
}

/// Result of an undo batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub success: bool,
    pub restored_files: Vec<RestoreRecord>,
    /// Original locations that were occupied, so the file was left in place
    #[serde(default)]
    pub conflicts: Vec<String>,
}

/// Entry point for listing, classifying and undoing
#[derive(Debug, Clone)]
pub struct ImageSorter {
    lister: FolderLister,
    engine: MoveEngine,
}

impl ImageSorter {
    pub fn new(profile: PlatformProfile) -> Self {
        let resolver = PathResolver::new(profile);
        Self {
            lister: FolderLister::new(resolver.clone()),
            engine: MoveEngine::new(resolver),
        }
    }

    /// List the supported images directly inside a folder
    pub fn list_images(&self, folder_path: &str) -> Result<Vec<ImageEntry>> {
        self.lister.list(folder_path)
    }

    /// Move each image into its label folder under `target_folder`
    pub fn classify_batch(
        &self,
        image_paths: &[String],
        labels: &[String],
        target_folder: &str,
    ) -> Result<ClassifyResponse> {
        if image_paths.len() != labels.len() {
            return Err(SorterError::LengthMismatch {
                paths: image_paths.len(),
                labels: labels.len(),
            });
        }
        for label in labels {
            validate_label(label)?;
        }

        info!(
            "Classifying {} images into {}",
            image_paths.len(),
            target_folder
        );

        let mut moved_files = Vec::new();
        for (i, (path, label)) in image_paths.iter().zip(labels).enumerate() {
            debug!("Processing image {}: {} -> {}", i + 1, path, label);
            match self.engine.classify(path, label, target_folder)? {
                Outcome::Completed(record) => moved_files.push(record),
                Outcome::Skipped(reason) => debug!("Skipping {} ({:?})", path, reason),
            }
        }

        info!("Moved {} of {} images", moved_files.len(), image_paths.len());
        Ok(ClassifyResponse {
            success: true,
            moved_files,
        })
    }

    /// Move each recorded file from its destination back to its source
    pub fn undo_batch(&self, moved_files: &[MoveRecord]) -> Result<UndoResponse> {
        let response = self.undo_with(moved_files, |current, original| {
            self.engine.restore(current, original)
        })?;
        info!(
            "Restored {} of {} files",
            response.restored_files.len(),
            moved_files.len()
        );
        Ok(response)
    }

    /// Report what [`undo_batch`](Self::undo_batch) would restore and which
    /// originals are occupied, moving nothing
    pub fn preview_undo(&self, moved_files: &[MoveRecord]) -> Result<UndoResponse> {
        self.undo_with(moved_files, |current, original| {
            self.engine.plan_restore(current, original)
        })
    }

    fn undo_with<F>(&self, moved_files: &[MoveRecord], mut restore: F) -> Result<UndoResponse>
    where
        F: FnMut(&str, &str) -> Result<Outcome<RestoreRecord>>,
    {
        let mut restored_files = Vec::new();
        let mut conflicts = Vec::new();

        for record in moved_files {
            match restore(&record.destination, &record.source) {
                Ok(Outcome::Completed(restored)) => restored_files.push(restored),
                Ok(Outcome::Skipped(reason)) => {
                    debug!("Not restoring {} ({:?})", record.destination, reason)
                }
                Err(SorterError::RestoreConflict(path)) => {
                    warn!(
                        "Not restoring {}: {} is occupied",
                        record.destination,
                        path.display()
                    );
                    conflicts.push(display_path(&path));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(UndoResponse {
            success: true,
            restored_files,
            conflicts,
        })
    }
}

impl Default for ImageSorter {
    fn default() -> Self {
        Self::new(PlatformProfile::Native)
    }
}
