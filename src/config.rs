//! Configuration with TOML-based sections.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::select::SelectionPolicy;
use crate::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Always pick the largest playlist without asking.
    #[serde(default)]
    pub use_largest_playlist: bool,

    /// Run without an operator.
    #[serde(default)]
    pub unattended: bool,

    /// In unattended mode, still confirm selections with the operator.
    #[serde(default)]
    pub unattended_confirm: bool,

    /// Candidates shorter than this are never the main feature.
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,

    /// Root of the `tmp/<run id>` artifact directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Default tracing filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub bdinfo: BdInfoSettings,

    #[serde(default)]
    pub mediainfo: MediaInfoSettings,
}

fn default_min_duration() -> f64 {
    600.0
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_largest_playlist: false,
            unattended: false,
            unattended_confirm: false,
            min_duration_secs: default_min_duration(),
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            bdinfo: BdInfoSettings::default(),
            mediainfo: MediaInfoSettings::default(),
        }
    }
}

/// How to run the BDInfo report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BdInfoSettings {
    #[serde(default = "default_bdinfo_executable")]
    pub executable: PathBuf,

    /// Run the executable through `mono`.
    #[serde(default = "default_use_mono")]
    pub use_mono: bool,

    /// Wait before the single retry when no report appeared.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_bdinfo_executable() -> PathBuf {
    PathBuf::from("bin/BDInfo/BDInfo.exe")
}

fn default_use_mono() -> bool {
    cfg!(not(windows))
}

fn default_retry_delay() -> u64 {
    5
}

impl Default for BdInfoSettings {
    fn default() -> Self {
        Self {
            executable: default_bdinfo_executable(),
            use_mono: default_use_mono(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfoSettings {
    #[serde(default = "default_mediainfo_binary")]
    pub binary: PathBuf,
}

fn default_mediainfo_binary() -> PathBuf {
    PathBuf::from("mediainfo")
}

impl Default for MediaInfoSettings {
    fn default() -> Self {
        Self {
            binary: default_mediainfo_binary(),
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if !config.min_duration_secs.is_finite() || config.min_duration_secs < 0.0 {
            return Err(Error::Config(format!(
                "min_duration_secs must be a non-negative number, got {}",
                config.min_duration_secs
            )));
        }
        Ok(config)
    }

    /// The selection policy these flags stand for.
    pub fn selection_policy(&self) -> SelectionPolicy {
        if self.use_largest_playlist || (self.unattended && !self.unattended_confirm) {
            SelectionPolicy::LargestOnly
        } else {
            SelectionPolicy::Interactive
        }
    }

    /// Whether the operator may be asked anything (editions, selections).
    pub fn prompts_allowed(&self) -> bool {
        !self.unattended || self.unattended_confirm
    }
}
