// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image Sorter: manual image classification service
//!
//! Lists images in a folder, moves them into label-named subfolders and
//! undoes those moves. The HTTP API in [`web`] is a thin layer over
//! [`sorter::ImageSorter`].

pub mod config;
pub mod error;
pub mod history;
pub mod lister;
pub mod mover;
pub mod paths;
pub mod sorter;
pub mod web;

pub use config::AppConfig;
pub use error::{Result, SorterError};
pub use lister::{ImageEntry, SUPPORTED_EXTENSIONS};
pub use mover::{MoveRecord, Outcome, RestoreRecord, SkipReason};
pub use paths::{PathResolver, PlatformProfile};
pub use sorter::ImageSorter;

/// Initialize tracing for the binaries
pub fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
