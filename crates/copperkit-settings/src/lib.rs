//! CopperKit Settings Crate
//!
//! Handles persisted configuration for the clearing engine and the default
//! tool catalog, plus the mapping from external setting names to fields.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{CatalogSettings, ClearingSettings, Config, SettingKey, SETTING_KEYS};
pub use error::{SettingsError, SettingsResult};
pub use persistence::SettingsPersistence;
