//! Settings Persistence
//!
//! Resolves the platform configuration directory and loads or saves the
//! [`Config`] stored there. A missing file is not an error: defaults are used
//! until the first save.

use crate::config::Config;
use crate::error::{SettingsError, SettingsResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "copperkit";
const CONFIG_FILE: &str = "config.toml";

/// Settings persistence layer
#[derive(Debug, Clone)]
pub struct SettingsPersistence {
    config: Config,
    path: PathBuf,
}

impl SettingsPersistence {
    /// Platform configuration directory for CopperKit.
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Default configuration file path.
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load from `path`, or start from defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        let config = if path.exists() {
            Config::load_from_file(path)
                .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?
        } else {
            info!("No config at {}, using defaults", path.display());
            Config::default()
        };
        Ok(Self {
            config,
            path: path.to_path_buf(),
        })
    }

    /// Load from the platform default location.
    pub fn load_default() -> SettingsResult<Self> {
        Self::load_or_default(&Self::default_path()?)
    }

    /// Write the config back to where it was loaded from.
    pub fn save(&self) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
            })?;
        }
        self.config
            .save_to_file(&self.path)
            .map_err(|e| SettingsError::SaveError(e.to_string()))?;
        debug!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// File this layer reads from and writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get reference to config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable reference to config
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        self.config.validate()
    }
}
