use crate::error::{FwumdError, Result};
use crate::model::Dims;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const CONFIG_DIR_ENV: &str = "FWUMD_CONFIG_DIR";
const DEFAULT_NB_FW_IMG: usize = 1;
const DEFAULT_NB_FW_BANKS: usize = 2;
const DEFAULT_LOCATION: &str = "sda";

/// Configuration for fwumd, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FwumdConfig {
    /// Image count used when a command is not told one
    #[serde(default = "default_nb_fw_img")]
    pub nb_fw_img: usize,

    /// Bank count used when a command is not told one
    #[serde(default = "default_nb_fw_banks")]
    pub nb_fw_banks: usize,

    /// Reject binaries whose stored checksum does not match
    #[serde(default)]
    pub verify_checksum: bool,

    /// Location offered by the interactive builder
    #[serde(default = "default_location")]
    pub default_location: String,
}

fn default_nb_fw_img() -> usize {
    DEFAULT_NB_FW_IMG
}

fn default_nb_fw_banks() -> usize {
    DEFAULT_NB_FW_BANKS
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Default for FwumdConfig {
    fn default() -> Self {
        Self {
            nb_fw_img: DEFAULT_NB_FW_IMG,
            nb_fw_banks: DEFAULT_NB_FW_BANKS,
            verify_checksum: false,
            default_location: default_location(),
        }
    }
}

impl FwumdConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(FwumdError::Io)?;
        let config: FwumdConfig =
            serde_json::from_str(&content).map_err(FwumdError::Serialization)?;
        Ok(config)
    }

    /// Picks the config directory: explicit flag, then `FWUMD_CONFIG_DIR`,
    /// then the platform config dir.
    pub fn resolve_dir(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = explicit {
            return Some(dir.to_path_buf());
        }
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("", "", "fwumd").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.nb_fw_img, self.nb_fw_banks)
    }
}
