//! Configuration types for tunepack

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{SizeCap, SizeUnit};

/// Archive assembly configuration
///
/// Groups settings for how archives are built. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Default number of songs per archive when batching a playlist (default: 50)
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Compression method for archive entries
    #[serde(default)]
    pub compression: Compression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            compression: Compression::default(),
        }
    }
}

/// Compression method for ZIP entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Store entries uncompressed
    Stored,
    /// DEFLATE compression
    #[default]
    Deflated,
}

impl Compression {
    /// The corresponding `zip` crate method
    pub(crate) fn method(&self) -> zip::CompressionMethod {
        match self {
            Compression::Stored => zip::CompressionMethod::Stored,
            Compression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Session data-volume limits
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Ceiling value for one processing pass (default: 2)
    #[serde(default = "default_size_cap_value")]
    pub size_cap_value: f64,

    /// Unit the ceiling is expressed in (default: GB)
    #[serde(default)]
    pub size_cap_unit: SizeUnit,
}

impl LimitsConfig {
    /// The configured ceiling as a [`SizeCap`]
    pub fn size_cap(&self) -> SizeCap {
        SizeCap::new(self.size_cap_value, self.size_cap_unit)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            size_cap_value: default_size_cap_value(),
            size_cap_unit: SizeUnit::default(),
        }
    }
}

/// Main configuration for a [`crate::session::Session`]
///
/// Sub-config fields are flattened so the serialized form stays flat
/// (no nesting in the JSON document).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Archive assembly settings
    #[serde(flatten)]
    pub archive: ArchiveConfig,

    /// Size-cap settings
    #[serde(flatten)]
    pub limits: LimitsConfig,

    /// Emit per-item progress events (default: true)
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            limits: LimitsConfig::default(),
            progress: default_true(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON document
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Default batch size for playlist archives
    pub fn default_batch_size(&self) -> usize {
        self.archive.default_batch_size
    }

    /// The configured size cap
    pub fn size_cap(&self) -> SizeCap {
        self.limits.size_cap()
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_size_cap_value() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_batch_size(), 50);
        assert_eq!(config.size_cap(), SizeCap::new(2.0, SizeUnit::Gb));
        assert_eq!(config.archive.compression, Compression::Deflated);
        assert!(config.progress);
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = Config::from_json(r#"{"default_batch_size": 10}"#).unwrap();
        assert_eq!(config.default_batch_size(), 10);
        // untouched fields keep their defaults
        assert_eq!(config.size_cap(), SizeCap::new(2.0, SizeUnit::Gb));
    }

    #[test]
    fn test_from_json_full_document() {
        let json = r#"{
            "default_batch_size": 25,
            "compression": "stored",
            "size_cap_value": 500,
            "size_cap_unit": "mb",
            "progress": false
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.default_batch_size(), 25);
        assert_eq!(config.archive.compression, Compression::Stored);
        assert_eq!(config.size_cap(), SizeCap::new(500.0, SizeUnit::Mb));
        assert!(!config.progress);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Config::from_json("not json").is_err());
    }
}
