//! Job files
//!
//! A job file is a JSON document holding the named geometry objects, the
//! clearing target and boundary source, and the tools to use. Anything it
//! leaves out comes from the [`Config`].
//!
//! ```json
//! {
//!   "objects": [{ "name": "top", "kind": "artwork", "geometry": [...] }],
//!   "target": "top",
//!   "reference_mode": "area",
//!   "area_shapes": [...],
//!   "tools": [{ "diameter": 1.0 }, { "diameter": 0.2, "method": "lines" }]
//! }
//! ```

use anyhow::Context;
use copperkit_camtools::{ClearingJob, ObjectStore, TargetObject};
use copperkit_core::{ParamOverrides, ReferenceMode, ToolCatalog, ToolOrder, ToolShape};
use copperkit_settings::Config;
use geo::Polygon;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One requested tool; unset parameters inherit the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTool {
    pub diameter: f64,
    #[serde(default)]
    pub shape: ToolShape,
    #[serde(flatten)]
    pub overrides: ParamOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    /// Name of the produced object; defaults to `<target>_ncc`
    #[serde(default)]
    pub output_name: Option<String>,
    pub objects: Vec<TargetObject>,
    pub target: String,
    #[serde(default)]
    pub reference_mode: Option<ReferenceMode>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub area_shapes: Vec<Polygon>,
    /// Empty means the configured default diameters
    #[serde(default)]
    pub tools: Vec<JobTool>,
    /// Add the configured V-shape tool
    #[serde(default)]
    pub vshape: bool,
    #[serde(default)]
    pub margin: Option<f64>,
    #[serde(default)]
    pub rest_machining: Option<bool>,
}

impl JobFile {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Invalid job file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Tool catalog for this job: the listed tools, or the configured
    /// defaults when none are listed.
    pub fn catalog(&self, config: &Config) -> anyhow::Result<ToolCatalog> {
        let mut catalog = if self.tools.is_empty() {
            config.build_catalog()?
        } else {
            config.validate()?;
            ToolCatalog::new(config.clearing_params(), config.catalog.decimals)
        };
        for tool in &self.tools {
            catalog
                .add_tool(tool.diameter, tool.shape, &tool.overrides)
                .with_context(|| format!("Cannot add tool of diameter {}", tool.diameter))?;
        }
        if self.vshape {
            config.add_default_vshape(&mut catalog)?;
        }
        Ok(catalog)
    }

    /// Resolve the job against `config` into an object store and a run.
    pub fn build(&self, config: &Config) -> anyhow::Result<(ObjectStore, ClearingJob)> {
        let settings = &config.clearing;
        let catalog = self.catalog(config)?;

        let mut objects = ObjectStore::new();
        for object in &self.objects {
            objects.insert(object.clone());
        }
        debug!(
            "Job for '{}': {} object(s), {} tool(s)",
            self.target,
            objects.len(),
            catalog.len()
        );

        let job = ClearingJob {
            output_name: self
                .output_name
                .clone()
                .unwrap_or_else(|| format!("{}_ncc", self.target)),
            reference_mode: self.reference_mode.unwrap_or(settings.reference_mode),
            target: self.target.clone(),
            reference: self.reference.clone(),
            area_shapes: self.area_shapes.clone(),
            tools: catalog.snapshot(ToolOrder::Table),
            rest_machining: self.rest_machining.unwrap_or(settings.rest_machining),
            margin: self.margin.unwrap_or(settings.margin),
            tool_order: settings.tool_order,
            copper_offset: settings.copper_offset,
            parallel: settings.parallel,
            progressive: settings.progressive,
        };
        Ok((objects, job))
    }
}
