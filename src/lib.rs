//! # CopperKit
//!
//! Non-copper clearing for isolation-milled printed circuit boards: given a
//! copper layer, a boundary and a set of end mills, it produces per-tool
//! cutting paths that remove all copper outside pads and traces.
//!
//! ## Architecture
//!
//! CopperKit is organized as a workspace with multiple crates:
//!
//! 1. **copperkit-core** - Tool catalog, tool parameters, cancellation, progress
//! 2. **copperkit-settings** - Persisted JSON/TOML configuration
//! 3. **copperkit-camtools** - Region, empty area, pass strategies, orchestrator
//! 4. **copperkit** - Job files, reports and the command line binary

pub mod job;
pub mod report;

pub use copperkit_camtools::{run_clearing, ClearingError, ClearingJob, RunOutcome, RunStatus};
pub use copperkit_core::{CancellationToken, ProgressSink, Tool, ToolCatalog};
pub use copperkit_settings::{Config, SettingsPersistence};
pub use job::{JobFile, JobTool};
pub use report::{RunReport, ToolReport};

use anyhow::Context;
use std::path::Path;
use tracing::{debug, info, warn};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, keeping stdout free for reports
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(())
}

/// Load the configuration from `path`, or from the platform config file.
///
/// A missing platform file yields defaults; an explicit path must exist.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => match SettingsPersistence::load_default() {
            Ok(persistence) => Ok(persistence.config().clone()),
            Err(e) => {
                warn!("No usable config file, using defaults: {}", e);
                Ok(Config::default())
            }
        },
    }
}

/// Apply `key=value` overrides on top of a loaded configuration.
pub fn apply_overrides(config: &mut Config, overrides: &[String]) -> anyhow::Result<()> {
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", entry))?;
        config
            .set_value(key.trim(), value.trim())
            .with_context(|| format!("Invalid override '{}'", entry))?;
        debug!("Override {} = {}", key.trim(), value.trim());
    }
    Ok(())
}

/// Progress sink that reports through the log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn percent(&self, value: u8) {
        debug!("Progress {}%", value);
    }

    fn status(&self, message: &str) {
        info!("{}", message);
    }

    fn preview(&self, tool_id: u64, paths: &[Vec<(f64, f64)>]) {
        debug!("Preview for T{}: {} path(s)", tool_id, paths.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            &["ncc.overlap = 0.25".to_string(), "ncc.rest=true".to_string()],
        )
        .unwrap();
        assert_eq!(config.clearing.overlap, 0.25);
        assert!(config.clearing.rest_machining);
    }

    #[test]
    fn test_override_without_value() {
        let mut config = Config::default();
        let err = apply_overrides(&mut config, &["ncc.overlap".to_string()]).unwrap_err();
        assert!(err.to_string().contains("key=value"));
    }

    #[test]
    fn test_override_rejected_leaves_config() {
        let mut config = Config::default();
        assert!(apply_overrides(&mut config, &["ncc.overlap=2".to_string()]).is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
