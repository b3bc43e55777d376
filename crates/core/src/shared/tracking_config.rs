use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::blob_detector::DetectorConfig;
use crate::preprocessing::domain::background_model::BackgroundMethod;
use crate::shared::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CANNY_LOWER, DEFAULT_CANNY_UPPER, DEFAULT_CELL_RADIUS,
    DEFAULT_MAX_CENTROID_DISTANCE, DEFAULT_RESULTS_DIR, DEFAULT_TIMEOUT, SETTINGS_DIR_NAME,
    SETTINGS_FILE_NAME,
};
use crate::tracking::domain::registry_config::{ExpiryPolicy, MatchingStrategy, RegistryConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("canny_lower ({lower}) must be below canny_upper ({upper})")]
    CannyThresholds { lower: u32, upper: u32 },
    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

/// Every tunable of a tracking run, persisted as a JSON settings file.
///
/// Missing keys fall back to their defaults, so settings files written by
/// older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub canny_upper: u32,
    pub canny_lower: u32,
    pub max_centroid_distance: u32,
    pub timeout: u32,
    pub cell_radius: u32,
    pub save_overlay: bool,
    pub csv_save_path: PathBuf,
    pub matching: MatchingStrategy,
    pub expiry: ExpiryPolicy,
    pub background: BackgroundMethod,
    pub batch_size: usize,
    pub record_history: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            canny_upper: DEFAULT_CANNY_UPPER,
            canny_lower: DEFAULT_CANNY_LOWER,
            max_centroid_distance: DEFAULT_MAX_CENTROID_DISTANCE,
            timeout: DEFAULT_TIMEOUT,
            cell_radius: DEFAULT_CELL_RADIUS,
            save_overlay: false,
            csv_save_path: PathBuf::from(DEFAULT_RESULTS_DIR),
            matching: MatchingStrategy::Greedy,
            expiry: ExpiryPolicy::RecordAll,
            background: BackgroundMethod::Mog2,
            batch_size: DEFAULT_BATCH_SIZE,
            record_history: false,
        }
    }
}

impl TrackingConfig {
    /// `<user config dir>/cellcount/settings.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Encode)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects values the tracking core cannot run with.
    ///
    /// The core itself assumes a validated configuration; this is the
    /// check callers run before handing the config over.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canny_lower >= self.canny_upper {
            return Err(ConfigError::CannyThresholds {
                lower: self.canny_lower,
                upper: self.canny_upper,
            });
        }
        if self.cell_radius == 0 {
            return Err(ConfigError::NotPositive("cell_radius"));
        }
        if self.max_centroid_distance == 0 {
            return Err(ConfigError::NotPositive("max_centroid_distance"));
        }
        if self.timeout == 0 {
            return Err(ConfigError::NotPositive("timeout"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::NotPositive("batch_size"));
        }
        if let ExpiryPolicy::DropUnconfirmed {
            min_frames_tracked: 0,
        } = self.expiry
        {
            return Err(ConfigError::NotPositive("min_frames_tracked"));
        }
        Ok(())
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            canny_lower: self.canny_lower,
            canny_upper: self.canny_upper,
            cell_radius: self.cell_radius,
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_centroid_distance: self.max_centroid_distance,
            timeout: self.timeout,
            matching: self.matching,
            expiry: self.expiry,
        }
    }
}
