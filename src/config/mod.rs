// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editor settings.
//!
//! Settings live in an optional YAML file; every field has a default so
//! a partial file (or none at all) is valid.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_COMPRESSION_LEVEL;
use crate::tracks::UNNAMED_TRACK;

/// Editor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Name shown for tracks without one
    pub unnamed_track: String,
    /// gzip level used when saving (0-9)
    pub compression_level: u32,
    /// UI redraw rate in frames per second
    pub frame_rate: u32,
    /// Seconds a status message stays visible
    pub status_timeout_secs: u64,
    /// Show groups expanded after loading
    pub start_expanded: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            unnamed_track: UNNAMED_TRACK.to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            frame_rate: 30,
            status_timeout_secs: 4,
            start_expanded: true,
        }
    }
}

impl EditorConfig {
    /// Load and validate settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config = Self::from_yaml(&contents)?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save settings to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            bail!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            );
        }
        if !(1..=120).contains(&self.frame_rate) {
            bail!("frame_rate must be between 1 and 120, got {}", self.frame_rate);
        }
        if self.unnamed_track.trim().is_empty() {
            bail!("unnamed_track must not be empty");
        }
        Ok(())
    }
}
