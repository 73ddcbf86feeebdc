//! Installer configuration
//!
//! All settings default to the values needed to flash the Yadigar firmware
//! onto a TTGO T-Display. A `yadigar-diy.toml` file can override any of them;
//! the [Config] type handles locating and loading it, and [InstallPaths]
//! derives the on-disk layout used by every step.

use std::{
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use directories::{BaseDirs, ProjectDirs};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Error;

const CONFIG_FILE_NAME: &str = "yadigar-diy.toml";

/// Firmware source and release metadata
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Firmware {
    /// Git repository of the firmware
    pub repository: String,
    /// GitHub API endpoint describing the latest release
    pub release_api: String,
    /// Board specific defaults, relative to the firmware checkout
    pub defaults: PathBuf,
}

impl Default for Firmware {
    fn default() -> Self {
        Self {
            repository: "https://github.com/sukunetsiz/yadigar.git".into(),
            release_api: "https://api.github.com/repos/sukunetsiz/yadigar/releases/latest".into(),
            defaults: PathBuf::from("configs/sdkconfig_display_ttgo_tdisplay.defaults"),
        }
    }
}

/// ESP-IDF toolchain settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Toolchain {
    /// Git repository of ESP-IDF
    pub repository: String,
    /// Pinned ESP-IDF release
    pub tag: String,
    /// Chip target passed to `install.sh`
    pub target: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            repository: "https://github.com/espressif/esp-idf.git".into(),
            tag: "v5.3.1".into(),
            target: "esp32".into(),
        }
    }
}

/// The board being flashed
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Device {
    /// Human readable board name
    pub name: String,
    /// Character device the board shows up as
    pub path: PathBuf,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            name: "TTGO T-Display".into(),
            path: PathBuf::from("/dev/ttyACM0"),
        }
    }
}

/// Complete installer configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub firmware: Firmware,
    pub toolchain: Toolchain,
    pub device: Device,
    /// Newline separated list of commands that must be installed
    pub depends_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firmware: Firmware::default(),
            toolchain: Toolchain::default(),
            device: Device::default(),
            depends_url: "https://github.com/sukunetsiz/yadigar-diy/raw/master/depends.txt".into(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the first `yadigar-diy.toml`
    /// found in the current or global configuration directory.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::find_config_path()? {
                Some(path) => path,
                None => {
                    debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let raw = match read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Configuration file {} does not exist", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_toml(&raw).map_err(|source| Error::InvalidConfig {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Config: {:#?}", &config);

        Ok(config)
    }

    fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn find_config_path() -> Result<Option<PathBuf>, Error> {
        let local_config = std::env::current_dir()?.join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Ok(Some(local_config));
        }

        Ok(ProjectDirs::from("com", "sukunetsiz", "yadigar-diy")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists()))
    }
}

/// On-disk layout of an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// Root of everything the installer writes
    pub work: PathBuf,
    /// Scratch space, removed on exit
    pub temp: PathBuf,
    /// Where ESP-IDF is cloned before it is known to be complete
    pub toolchain_staging: PathBuf,
    /// Permanent ESP-IDF installation
    pub toolchain: PathBuf,
    /// Firmware checkout and build tree
    pub firmware: PathBuf,
}

impl InstallPaths {
    /// Layout rooted at `work`
    pub fn new(work: impl Into<PathBuf>) -> Self {
        let work = work.into();
        let temp = work.join("temp");

        Self {
            toolchain_staging: temp.join("esp-idf"),
            toolchain: work.join("esp-idf"),
            firmware: work.join("yadigar"),
            temp,
            work,
        }
    }

    /// Layout rooted at `~/Downloads/diy_yadigar`
    pub fn from_home() -> Result<Self, Error> {
        let home = BaseDirs::new().ok_or(Error::NoHomeDirectory)?;

        Ok(Self::new(Self::work_dir_in(home.home_dir())))
    }

    fn work_dir_in(home: &Path) -> PathBuf {
        home.join("Downloads").join("diy_yadigar")
    }

    /// Script that sets up the ESP-IDF environment
    pub fn export_script(&self) -> PathBuf {
        self.toolchain.join("export.sh")
    }

    /// The toolchain is complete once its export script exists
    pub fn toolchain_installed(&self) -> bool {
        self.export_script().exists()
    }

    /// The firmware source is prepared once its directory exists
    pub fn firmware_prepared(&self) -> bool {
        self.firmware.exists()
    }
}

/// Whether the `CI` environment variable requests a build-only run
pub fn ci_requested() -> bool {
    is_ci_value(std::env::var("CI").ok().as_deref())
}

fn is_ci_value(value: Option<&str>) -> bool {
    value == Some("true")
}
