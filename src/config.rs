use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Base URL of the remote image service.
    pub endpoint: String,
    /// Viewport width requested from the image service, in pixels.
    pub image_width: u32,
    /// Viewport height requested from the image service, in pixels.
    pub image_height: u32,
    /// Per-image HTTP fetch timeout.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Delay before the connectivity probe reports, simulating a real check.
    #[serde(with = "humantime_serde")]
    pub connectivity_check_delay: Duration,
    /// File holding the single serialized history slot.
    pub history_path: PathBuf,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path).map_err(Error::Io)?;
        Ok(serde_yaml::from_str(&s).map_err(Error::Config)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        while self.endpoint.ends_with('/') {
            self.endpoint.pop();
        }
        ensure!(!self.endpoint.is_empty(), "endpoint must not be empty");
        ensure!(self.image_width > 0, "image-width must be greater than zero");
        ensure!(
            self.image_height > 0,
            "image-height must be greater than zero"
        );
        ensure!(
            self.fetch_timeout > Duration::ZERO,
            "fetch-timeout must be positive"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            endpoint: "https://cataas.com".to_string(),
            image_width: 400,
            image_height: 400,
            fetch_timeout: Duration::from_secs(8),
            connectivity_check_delay: Duration::from_secs(1),
            history_path: PathBuf::from("telecat_history.json"),
        }
    }
}
