use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_FILE, DEFAULT_DATA_DIR, DEFAULT_LOG_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCES_FILE,
};
use crate::error::{Result, WsiError};

/// Runtime locations for one run. The indicator table, exclusion set and
/// year range are compiled in and cannot be changed here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Source registry; relative paths resolve against `data_dir`
    pub sources_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            sources_file: PathBuf::from(DEFAULT_SOURCES_FILE),
        }
    }
}

impl Config {
    /// Read `path` (or `wsi.toml` in the working directory), falling back
    /// to defaults when the default file is absent, then apply `WSI_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WsiError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("WSI_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WSI_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WSI_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WSI_SOURCES_FILE") {
            self.sources_file = PathBuf::from(v);
        }
    }

    pub fn sources_path(&self) -> PathBuf {
        if self.sources_file.is_absolute() {
            self.sources_file.clone()
        } else {
            self.data_dir.join(&self.sources_file)
        }
    }
}
