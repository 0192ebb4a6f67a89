//! Configuration for the clearing engine and the default tool catalog
//!
//! Configuration is organized into two sections:
//! - Clearing defaults (overlap, margin, method, reference mode, run options)
//! - Catalog defaults (units, rounding precision, starting tool diameters)
//!
//! Supports JSON and TOML files. External setting names such as
//! `"ncc.overlap"` map onto fields through the [`SETTING_KEYS`] table.

pub use copperkit_core::units::MeasurementSystem;
use copperkit_core::{
    ClearingMethod, ClearingParams, MillingDirection, OperationKind, ParamOverrides,
    ReferenceMode, ToolCatalog, ToolOrder, ToolShape,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Clearing engine defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearingSettings {
    /// Pass overlap fraction, `[0, 1)`
    pub overlap: f64,
    /// Distance the boundary is grown around its reference
    pub margin: f64,
    /// Default pass generation method
    pub method: ClearingMethod,
    /// Default operation for new tools
    pub operation: OperationKind,
    /// Join passes with short connectors
    pub connect: bool,
    /// Finish each polygon with a boundary pass
    pub contour: bool,
    /// Climb or conventional
    pub milling: MillingDirection,
    /// Extra clearance around protected copper
    pub copper_offset: Option<f64>,
    /// Boundary source
    pub reference_mode: ReferenceMode,
    /// Carry residual area from larger to smaller tools
    pub rest_machining: bool,
    /// Tool order for single-pass clearing
    pub tool_order: ToolOrder,
    /// Clear independent polygons on the rayon pool
    pub parallel: bool,
    /// Forward each polygon's passes to the progress sink
    pub progressive: bool,
}

impl Default for ClearingSettings {
    fn default() -> Self {
        Self {
            overlap: 0.4,
            margin: 1.0,
            method: ClearingMethod::Standard,
            operation: OperationKind::Clear,
            connect: true,
            contour: true,
            milling: MillingDirection::Climb,
            copper_offset: None,
            reference_mode: ReferenceMode::SelfTarget,
            rest_machining: false,
            tool_order: ToolOrder::Descending,
            parallel: true,
            progressive: false,
        }
    }
}

/// Tool catalog defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Document units
    pub units: MeasurementSystem,
    /// Decimal places used when comparing diameters
    pub decimals: u32,
    /// Flat tools created in a fresh catalog
    pub default_diameters: Vec<f64>,
    /// V-tip diameter for computed V-shape tools
    pub vtip_diameter: f64,
    /// V-tip included angle in degrees
    pub vtip_angle: f64,
    /// Cut depth used to compute the V-shape width (negative is into the stock)
    pub cut_z: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            units: MeasurementSystem::Metric,
            decimals: MeasurementSystem::Metric.default_decimals(),
            default_diameters: vec![1.0, 0.5],
            vtip_diameter: 0.1,
            vtip_angle: 30.0,
            cut_z: -0.05,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Clearing engine defaults
    pub clearing: ClearingSettings,
    /// Catalog defaults
    pub catalog: CatalogSettings,
}

/// Field addressed by an external setting name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Overlap,
    Margin,
    Method,
    Operation,
    Connect,
    Contour,
    Milling,
    CopperOffset,
    ReferenceMode,
    RestMachining,
    ToolOrder,
    Parallel,
    Progressive,
    Units,
    Decimals,
    DefaultDiameters,
    VTipDiameter,
    VTipAngle,
    CutZ,
}

/// External setting names, built once. Names are case sensitive.
pub static SETTING_KEYS: &[(&str, SettingKey)] = &[
    ("ncc.overlap", SettingKey::Overlap),
    ("ncc.margin", SettingKey::Margin),
    ("ncc.method", SettingKey::Method),
    ("ncc.operation", SettingKey::Operation),
    ("ncc.connect", SettingKey::Connect),
    ("ncc.contour", SettingKey::Contour),
    ("ncc.milling", SettingKey::Milling),
    ("ncc.offset", SettingKey::CopperOffset),
    ("ncc.reference", SettingKey::ReferenceMode),
    ("ncc.rest", SettingKey::RestMachining),
    ("ncc.order", SettingKey::ToolOrder),
    ("ncc.parallel", SettingKey::Parallel),
    ("ncc.progressive", SettingKey::Progressive),
    ("tools.units", SettingKey::Units),
    ("tools.decimals", SettingKey::Decimals),
    ("tools.diameters", SettingKey::DefaultDiameters),
    ("tools.vtip_dia", SettingKey::VTipDiameter),
    ("tools.vtip_angle", SettingKey::VTipAngle),
    ("tools.cut_z", SettingKey::CutZ),
];

impl SettingKey {
    /// Look up the key registered under `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        SETTING_KEYS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, key)| *key)
    }

    /// External name of this key.
    pub fn name(self) -> &'static str {
        SETTING_KEYS
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> SettingsResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| SettingsError::invalid(key, e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> SettingsResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(SettingsError::invalid(
            key,
            format!("'{}' is not a boolean", other),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let c = &self.clearing;
        if !(0.0..1.0).contains(&c.overlap) {
            return Err(SettingsError::invalid("ncc.overlap", "must be in [0, 1)"));
        }
        if !c.margin.is_finite() {
            return Err(SettingsError::invalid("ncc.margin", "must be finite"));
        }
        if let Some(offset) = c.copper_offset {
            if !offset.is_finite() || offset < 0.0 {
                return Err(SettingsError::invalid("ncc.offset", "must be >= 0"));
            }
        }

        let t = &self.catalog;
        if t.decimals > 10 {
            return Err(SettingsError::invalid("tools.decimals", "must be <= 10"));
        }
        if t.default_diameters.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(SettingsError::invalid(
                "tools.diameters",
                "diameters must be > 0",
            ));
        }
        if t.vtip_diameter < 0.0 {
            return Err(SettingsError::invalid("tools.vtip_dia", "must be >= 0"));
        }
        if !(t.vtip_angle > 0.0 && t.vtip_angle < 180.0) {
            return Err(SettingsError::invalid(
                "tools.vtip_angle",
                "must be in (0, 180)",
            ));
        }

        Ok(())
    }

    /// Set a field from its external name and a textual value.
    ///
    /// The config is left unchanged when the value does not parse or the
    /// result fails validation.
    pub fn set_value(&mut self, name: &str, value: &str) -> SettingsResult<()> {
        let key =
            SettingKey::from_name(name).ok_or_else(|| SettingsError::UnknownKey(name.into()))?;
        let mut next = self.clone();
        let c = &mut next.clearing;
        let t = &mut next.catalog;

        match key {
            SettingKey::Overlap => c.overlap = parse(name, value)?,
            SettingKey::Margin => c.margin = parse(name, value)?,
            SettingKey::Method => c.method = parse(name, value)?,
            SettingKey::Operation => c.operation = parse(name, value)?,
            SettingKey::Connect => c.connect = parse_bool(name, value)?,
            SettingKey::Contour => c.contour = parse_bool(name, value)?,
            SettingKey::Milling => c.milling = parse(name, value)?,
            SettingKey::CopperOffset => {
                c.copper_offset = match value.trim() {
                    "" | "none" => None,
                    v => Some(parse(name, v)?),
                }
            }
            SettingKey::ReferenceMode => c.reference_mode = parse(name, value)?,
            SettingKey::RestMachining => c.rest_machining = parse_bool(name, value)?,
            SettingKey::ToolOrder => c.tool_order = parse(name, value)?,
            SettingKey::Parallel => c.parallel = parse_bool(name, value)?,
            SettingKey::Progressive => c.progressive = parse_bool(name, value)?,
            SettingKey::Units => t.units = parse(name, value)?,
            SettingKey::Decimals => t.decimals = parse(name, value)?,
            SettingKey::DefaultDiameters => {
                t.default_diameters = value
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| parse(name, s))
                    .collect::<SettingsResult<Vec<f64>>>()?
            }
            SettingKey::VTipDiameter => t.vtip_diameter = parse(name, value)?,
            SettingKey::VTipAngle => t.vtip_angle = parse(name, value)?,
            SettingKey::CutZ => t.cut_z = parse(name, value)?,
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Current value of a field, formatted the way [`Config::set_value`] accepts it.
    pub fn get_value(&self, name: &str) -> SettingsResult<String> {
        let key =
            SettingKey::from_name(name).ok_or_else(|| SettingsError::UnknownKey(name.into()))?;
        let c = &self.clearing;
        let t = &self.catalog;
        let value = match key {
            SettingKey::Overlap => c.overlap.to_string(),
            SettingKey::Margin => c.margin.to_string(),
            SettingKey::Method => c.method.to_string(),
            SettingKey::Operation => c.operation.to_string(),
            SettingKey::Connect => c.connect.to_string(),
            SettingKey::Contour => c.contour.to_string(),
            SettingKey::Milling => c.milling.to_string(),
            SettingKey::CopperOffset => c
                .copper_offset
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string()),
            SettingKey::ReferenceMode => c.reference_mode.to_string(),
            SettingKey::RestMachining => c.rest_machining.to_string(),
            SettingKey::ToolOrder => format!("{:?}", c.tool_order),
            SettingKey::Parallel => c.parallel.to_string(),
            SettingKey::Progressive => c.progressive.to_string(),
            SettingKey::Units => t.units.to_string(),
            SettingKey::Decimals => t.decimals.to_string(),
            SettingKey::DefaultDiameters => t
                .default_diameters
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(","),
            SettingKey::VTipDiameter => t.vtip_diameter.to_string(),
            SettingKey::VTipAngle => t.vtip_angle.to_string(),
            SettingKey::CutZ => t.cut_z.to_string(),
        };
        Ok(value)
    }

    /// Per-tool parameters new catalog entries inherit.
    pub fn clearing_params(&self) -> ClearingParams {
        let c = &self.clearing;
        ClearingParams {
            overlap: c.overlap,
            operation: c.operation,
            method: c.method,
            connect: c.connect,
            contour: c.contour,
            copper_offset: c.copper_offset,
            milling: c.milling,
        }
    }

    /// Fresh catalog holding the default diameters as flat tools.
    pub fn build_catalog(&self) -> SettingsResult<ToolCatalog> {
        self.validate()?;
        let mut catalog = ToolCatalog::new(self.clearing_params(), self.catalog.decimals);
        for diameter in &self.catalog.default_diameters {
            catalog.add_tool(*diameter, ToolShape::Flat, &ParamOverrides::default())?;
        }
        debug!("Built default catalog with {} tools", catalog.len());
        Ok(catalog)
    }

    /// Add a V-shape tool computed from the configured tip geometry.
    pub fn add_default_vshape(&self, catalog: &mut ToolCatalog) -> SettingsResult<()> {
        let t = &self.catalog;
        catalog.add_vshape_tool(
            t.vtip_diameter,
            t.vtip_angle,
            t.cut_z,
            &ParamOverrides::default(),
        )?;
        Ok(())
    }
}
