// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the image sorter

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::paths::PlatformProfile;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// How Windows drive paths are handled
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Session history settings
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlatformMode {
    /// Detect WSL at startup
    #[default]
    Auto,
    /// Never rewrite drive paths
    Native,
    /// Always rewrite drive paths under `mount_prefix`
    DriveMount,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlatformConfig {
    #[serde(default)]
    pub mode: PlatformMode,
    #[serde(default = "default_mount_prefix")]
    pub mount_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    /// Batches kept for "undo last"
    #[serde(default = "default_max_batches")]
    pub max_batches: usize,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_mount_prefix() -> String { "/mnt".to_string() }
fn default_max_batches() -> usize { 20 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            mode: PlatformMode::default(),
            mount_prefix: default_mount_prefix(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_batches: default_max_batches(),
        }
    }
}

impl PlatformConfig {
    /// Settle on a platform profile. Called once at startup.
    pub fn profile(&self) -> PlatformProfile {
        match self.mode {
            PlatformMode::Auto => PlatformProfile::detect(&self.mount_prefix),
            PlatformMode::Native => PlatformProfile::Native,
            PlatformMode::DriveMount => PlatformProfile::DriveMount {
                prefix: self.mount_prefix.clone(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::SorterError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Address the server listens on
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
