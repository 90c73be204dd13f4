use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

fn verify_checksum_default() -> bool { return true }

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse config file: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Options controlling a single decode call.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Compare the CRC footer against the raw telegram bytes.
    #[serde(default="verify_checksum_default")]
    pub verify_checksum: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { verify_checksum: verify_checksum_default() }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checksum(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading parse options from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}
