//! Extraction configuration.
//!
//! Every field has a default matching the production archive, so an empty
//! (or absent) YAML file is a valid configuration. Environment variables
//! override the file.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deaccumulate::NegativeIncrementPolicy;
use crate::exceptions::ExceptionList;
use crate::layout::ArchiveLayout;

pub const DEFAULT_REGIONAL_ROOT: &str = "/lustre/storeB/project/fou/om/WINDSURFER/HM40h12/netcdf";
pub const DEFAULT_GLOBAL_ROOT: &str = "/lustre/storeB/project/fou/om/ERA/ERA5";
pub const DEFAULT_STRIDE_DAYS: i64 = 10;

/// Runtime settings for an extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Root of the regional forecast-cycle archive.
    #[serde(default = "default_regional_root")]
    pub regional_root: PathBuf,

    /// Root of the global monthly archive (`atm/` and `wave/` below it).
    #[serde(default = "default_global_root")]
    pub global_root: PathBuf,

    /// Length of one extraction stride in days.
    #[serde(default = "default_stride_days")]
    pub stride_days: i64,

    #[serde(default)]
    pub negative_increments: NegativeIncrementPolicy,

    /// Replaces the built-in calendar exception list.
    #[serde(default)]
    pub exceptions_file: Option<PathBuf>,

    /// Use global atmosphere files for parameters also found in wave files.
    #[serde(default = "default_prefer_atmosphere")]
    pub prefer_atmosphere: bool,
}

fn default_regional_root() -> PathBuf {
    PathBuf::from(DEFAULT_REGIONAL_ROOT)
}

fn default_global_root() -> PathBuf {
    PathBuf::from(DEFAULT_GLOBAL_ROOT)
}

fn default_stride_days() -> i64 {
    DEFAULT_STRIDE_DAYS
}

fn default_prefer_atmosphere() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            regional_root: default_regional_root(),
            global_root: default_global_root(),
            stride_days: default_stride_days(),
            negative_increments: NegativeIncrementPolicy::default(),
            exceptions_file: None,
            prefer_atmosphere: default_prefer_atmosphere(),
        }
    }
}

impl ExtractionConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ExtractionConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded extraction config");
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;

        info!(
            regional_root = %config.regional_root.display(),
            global_root = %config.global_root.display(),
            stride_days = config.stride_days,
            negative_increments = ?config.negative_increments,
            "Extraction configuration"
        );
        Ok(config)
    }

    /// Apply `NORA3_ROOT`, `ERA5_ROOT` and `EXTRACT_STRIDE_DAYS`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(root) = env::var("NORA3_ROOT") {
            self.regional_root = PathBuf::from(root);
        }
        if let Ok(root) = env::var("ERA5_ROOT") {
            self.global_root = PathBuf::from(root);
        }
        if let Ok(days) = env::var("EXTRACT_STRIDE_DAYS") {
            self.stride_days = days
                .parse()
                .with_context(|| format!("EXTRACT_STRIDE_DAYS is not a number: {}", days))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stride_days < 1 {
            bail!("stride_days must be at least 1, got {}", self.stride_days);
        }
        Ok(())
    }

    pub fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(&self.regional_root, &self.global_root)
    }

    /// The configured exception list, or the built-in one.
    pub fn exceptions(&self) -> Result<ExceptionList> {
        match &self.exceptions_file {
            Some(path) => ExceptionList::from_file(path),
            None => ExceptionList::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = ExtractionConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ExtractionConfig::default());
        assert_eq!(config.stride_days, 10);
        assert!(config.prefer_atmosphere);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "regional_root: /tmp/nora3\nnegative_increments: keep\n";
        let config = ExtractionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.regional_root, PathBuf::from("/tmp/nora3"));
        assert_eq!(config.global_root, PathBuf::from(DEFAULT_GLOBAL_ROOT));
        assert_eq!(config.negative_increments, NegativeIncrementPolicy::Keep);
    }

    #[test]
    fn test_rejects_zero_stride() {
        let config = ExtractionConfig {
            stride_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(ExtractionConfig::from_yaml_str("negative_increments: drop\n").is_err());
    }

    #[test]
    fn test_layout_uses_roots() {
        let config = ExtractionConfig::from_yaml_str("global_root: /era5\n").unwrap();
        assert_eq!(config.layout().global_root, PathBuf::from("/era5"));
    }
}
