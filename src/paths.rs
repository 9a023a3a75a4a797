// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Path decoding and normalization
//!
//! Paths arrive from a browser UI, percent-encoded and sometimes copied
//! across the Windows/WSL boundary (`C:\Users\...`). The resolver turns them
//! into paths this process can open.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How Windows drive paths map onto this process's filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatformProfile {
    /// Paths are used as given
    #[default]
    Native,
    /// Windows drives are mounted under `prefix` (`C:\` → `<prefix>/c/`)
    DriveMount { prefix: String },
}

impl PlatformProfile {
    /// Detect the profile of the running process
    pub fn detect(mount_prefix: &str) -> Self {
        let osrelease = std::fs::read_to_string("/proc/sys/kernel/osrelease").ok();
        let wsl = wsl_markers_present(
            std::env::var("WSL_DISTRO_NAME").ok().as_deref(),
            std::env::var("WSL_INTEROP").ok().as_deref(),
            osrelease.as_deref(),
        );

        if wsl {
            Self::DriveMount {
                prefix: mount_prefix.to_string(),
            }
        } else {
            Self::Native
        }
    }
}

/// Whether any WSL marker is set
fn wsl_markers_present(
    distro: Option<&str>,
    interop: Option<&str>,
    osrelease: Option<&str>,
) -> bool {
    if distro.is_some_and(|d| !d.is_empty()) || interop.is_some_and(|i| !i.is_empty()) {
        return true;
    }
    osrelease.is_some_and(|r| r.to_ascii_lowercase().contains("microsoft"))
}

/// Decodes raw path strings into filesystem paths
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    profile: PlatformProfile,
}

impl PathResolver {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    /// Decode and normalize a raw path. Never fails.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let decoded = decode(raw);
        PathBuf::from(self.normalize(&decoded).into_owned())
    }

    /// Rewrite a Windows drive path onto the drive mount, if there is one
    pub fn normalize<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let PlatformProfile::DriveMount { prefix } = &self.profile else {
            return Cow::Borrowed(path);
        };
        let Some((drive, rest)) = split_drive(path) else {
            return Cow::Borrowed(path);
        };

        // `C:\\Users` is `C:\Users` escaped twice
        let rest = rest.strip_prefix('\\').unwrap_or(rest);
        let rest = rest.replace("\\\\", "/").replace('\\', "/");

        Cow::Owned(format!(
            "{}/{}/{}",
            prefix.trim_end_matches('/'),
            drive.to_ascii_lowercase(),
            rest
        ))
    }
}

/// Percent-decode a path, falling back to the raw string on invalid UTF-8
pub fn decode(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Path is not valid UTF-8 once decoded ({}), using it raw", e);
            Cow::Borrowed(raw)
        }
    }
}

/// Render a path for output, replacing bytes that are not UTF-8
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn split_drive(path: &str) -> Option<(char, &str)> {
    let drive = path.chars().next()?;
    if !drive.is_ascii_alphabetic() {
        return None;
    }
    let rest = path[1..].strip_prefix(":\\")?;
    Some((drive, rest))
}
