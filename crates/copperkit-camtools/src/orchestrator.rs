//! Multi-tool orchestrator
//!
//! Drives one clearing run: region, empty area, then the per-tool loop in
//! either single-pass or rest-machining mode. All run state lives in the
//! [`NonCopperClearing`] value for that run.
//!
//! States: `Idle -> BuildingRegion -> ComputingEmptyArea -> ClearingTool(i)
//! -> Finalizing -> Done | Failed | Cancelled`.

use crate::clearing::{strategy_for, ClearOptions};
use crate::empty_area::{compute_empty, IsolationPass};
use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use crate::region::{build_region, TargetAccessor};
use copperkit_core::data::tools::sort_tools;
use copperkit_core::{
    CancellationToken, ProgressSink, ReferenceMode, Tool, ToolId, ToolOrder,
};
use geo::{LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Everything one run needs besides the object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingJob {
    /// Name of the produced geometry object
    pub output_name: String,
    pub reference_mode: ReferenceMode,
    /// Object holding the protected copper
    pub target: String,
    /// Boundary object for [`ReferenceMode::Reference`]
    #[serde(default)]
    pub reference: Option<String>,
    /// User drawn shapes for [`ReferenceMode::Area`]
    #[serde(default)]
    pub area_shapes: Vec<Polygon>,
    /// Catalog snapshot
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub rest_machining: bool,
    #[serde(default)]
    pub margin: f64,
    /// Tool order in single-pass mode
    #[serde(default)]
    pub tool_order: ToolOrder,
    /// Overrides the per-tool copper offsets when set
    #[serde(default)]
    pub copper_offset: Option<f64>,
    /// Clear the polygons of one tool on the rayon pool
    #[serde(default)]
    pub parallel: bool,
    /// Send each polygon's passes to the progress sink
    #[serde(default)]
    pub progressive: bool,
}

impl ClearingJob {
    pub fn new(output_name: impl Into<String>, target: impl Into<String>, tools: Vec<Tool>) -> Self {
        Self {
            output_name: output_name.into(),
            reference_mode: ReferenceMode::SelfTarget,
            target: target.into(),
            reference: None,
            area_shapes: Vec::new(),
            tools,
            rest_machining: false,
            margin: 0.0,
            tool_order: ToolOrder::Descending,
            copper_offset: None,
            parallel: false,
            progressive: false,
        }
    }
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    BuildingRegion,
    ComputingEmptyArea,
    ClearingTool(usize),
    Finalizing,
    Done,
    Failed,
    Cancelled,
}

/// Terminal status of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Done,
    Failed(ClearingError),
    Cancelled,
}

/// Geometry produced by one tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool: Tool,
    /// Cutting paths in machining order
    pub paths: Vec<LineString>,
    /// Area the tool actually removes
    pub cleared: MultiPolygon,
}

/// Outcome of [`run_clearing`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub output_name: String,
    pub status: RunStatus,
    /// Tools that produced geometry
    pub tools: BTreeMap<ToolId, ToolResult>,
    /// Union of the cleared areas of all tools
    pub solid_geometry: MultiPolygon,
    /// Tools whose isolation coverage is broken
    pub warnings: usize,
    /// Some polygon could not be cleared by any tool
    pub not_cleared: bool,
    pub uncleared_count: usize,
}

impl RunOutcome {
    fn terminal(output_name: String, status: RunStatus) -> Self {
        Self {
            output_name,
            status,
            tools: BTreeMap::new(),
            solid_geometry: geometry::empty(),
            warnings: 0,
            not_cleared: false,
            uncleared_count: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }

    /// Area of the aggregate solid geometry.
    pub fn cleared_area(&self) -> f64 {
        geometry::area(&self.solid_geometry)
    }
}

/// Paths and failures of one tool over one area
struct ToolPass {
    paths: Vec<LineString>,
    failed: Vec<Polygon>,
}

/// Polygons no tool could clear
#[derive(Default)]
struct Uncleared {
    polygons: usize,
}

fn percent(tool_index: usize, tool_count: usize, done: usize, total: usize) -> u8 {
    let fraction = (tool_index as f64 + done as f64 / total.max(1) as f64) / tool_count.max(1) as f64;
    (fraction * 100.0).clamp(0.0, 100.0) as u8
}

fn flatten(paths: &[LineString]) -> Vec<Vec<(f64, f64)>> {
    paths
        .iter()
        .map(|p| p.0.iter().map(|c| (c.x, c.y)).collect())
        .collect()
}

/// One clearing run.
pub struct NonCopperClearing<'a> {
    job: &'a ClearingJob,
    objects: &'a dyn TargetAccessor,
    cancel: &'a CancellationToken,
    progress: &'a dyn ProgressSink,
    state: RunState,
}

impl<'a> NonCopperClearing<'a> {
    pub fn new(
        job: &'a ClearingJob,
        objects: &'a dyn TargetAccessor,
        cancel: &'a CancellationToken,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            job,
            objects,
            cancel,
            progress,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("{}: {:?} -> {:?}", self.job.output_name, self.state, next);
        self.state = next;
    }

    fn check_cancel(&self) -> ClearingResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ClearingError::Cancelled);
        }
        Ok(())
    }

    /// Execute the run. Never returns partial geometry on failure or cancel.
    pub fn run(mut self) -> RunOutcome {
        let name = self.job.output_name.clone();
        match self.execute() {
            Ok(outcome) => {
                self.transition(RunState::Done);
                info!(
                    "{}: done, {} tool(s), area {:.4}, {} warning(s)",
                    name,
                    outcome.tools.len(),
                    outcome.cleared_area(),
                    outcome.warnings
                );
                self.progress.status("Clearing done");
                outcome
            }
            Err(ClearingError::Cancelled) => {
                self.transition(RunState::Cancelled);
                info!("{}: cancelled", name);
                self.progress.status("Clearing cancelled");
                RunOutcome::terminal(name, RunStatus::Cancelled)
            }
            Err(err) => {
                self.transition(RunState::Failed);
                warn!("{}: failed: {}", name, err);
                self.progress.status(&format!("Clearing failed: {}", err));
                RunOutcome::terminal(name, RunStatus::Failed(err))
            }
        }
    }

    fn validate(&self) -> ClearingResult<()> {
        if !self.job.margin.is_finite() {
            return Err(ClearingError::InvalidParameters(format!(
                "margin {} is not finite",
                self.job.margin
            )));
        }
        for tool in &self.job.tools {
            if !tool.diameter.is_finite() || tool.diameter <= 0.0 {
                return Err(ClearingError::InvalidParameters(format!(
                    "tool {} has diameter {}",
                    tool.id, tool.diameter
                )));
            }
            tool.params
                .validate()
                .map_err(|e| ClearingError::InvalidParameters(format!("tool {}: {}", tool.id, e)))?;
        }
        Ok(())
    }

    fn copper_offset(&self) -> Option<f64> {
        self.job.copper_offset.or_else(|| {
            self.job
                .tools
                .iter()
                .filter_map(|t| t.params.copper_offset)
                .reduce(f64::max)
        })
    }

    fn execute(&mut self) -> ClearingResult<RunOutcome> {
        if self.job.tools.is_empty() {
            return Err(ClearingError::NoGeometryProduced);
        }
        self.validate()?;
        self.check_cancel()?;

        self.transition(RunState::BuildingRegion);
        self.progress.status("Building clearing region");
        let objects = self.objects;
        let target = objects.object(&self.job.target).ok_or_else(|| {
            ClearingError::InvalidReference(format!("target '{}' not found", self.job.target))
        })?;
        let reference = match (self.job.reference_mode, &self.job.reference) {
            (ReferenceMode::Reference, Some(name)) => {
                Some(objects.object(name).ok_or_else(|| {
                    ClearingError::InvalidReference(format!("reference '{}' not found", name))
                })?)
            }
            _ => None,
        };
        let region = build_region(
            self.job.reference_mode,
            target,
            reference,
            &self.job.area_shapes,
            self.job.margin,
        )?;
        self.check_cancel()?;

        self.transition(RunState::ComputingEmptyArea);
        self.progress.status("Computing empty area");
        let (isolation_tools, mut clear_tools): (Vec<Tool>, Vec<Tool>) = self
            .job
            .tools
            .iter()
            .cloned()
            .partition(|t| t.is_isolation());
        let passes: Vec<IsolationPass> = isolation_tools
            .iter()
            .map(|t| IsolationPass {
                tool: t.id,
                diameter: t.diameter,
                milling: t.params.milling,
            })
            .collect();
        let empty = compute_empty(&region, &target.geometry, &passes, self.copper_offset())?;

        let mut results = BTreeMap::new();
        for rings in &empty.isolation {
            if let Some(tool) = isolation_tools.iter().find(|t| t.id == rings.tool) {
                let cleared =
                    geometry::intersection(&geometry::sweep(&rings.rings, tool.diameter), &region);
                results.insert(
                    tool.id,
                    ToolResult {
                        tool: tool.clone(),
                        paths: rings.rings.clone(),
                        cleared,
                    },
                );
            }
        }

        let uncleared = if self.job.rest_machining {
            sort_tools(&mut clear_tools, ToolOrder::Descending);
            self.rest_machining(&empty.area, &clear_tools, &mut results)?
        } else {
            sort_tools(&mut clear_tools, self.job.tool_order);
            self.single_pass(&empty.area, &clear_tools, &mut results)?
        };

        self.transition(RunState::Finalizing);
        results.retain(|_, r| !r.paths.is_empty());
        if results.is_empty() {
            return Err(ClearingError::NoGeometryProduced);
        }
        let solid_geometry = geometry::union_all(results.values().map(|r| r.cleared.clone()));
        self.progress.percent(100);

        Ok(RunOutcome {
            output_name: self.job.output_name.clone(),
            status: RunStatus::Done,
            tools: results,
            solid_geometry,
            warnings: empty.warnings,
            not_cleared: uncleared.polygons > 0,
            uncleared_count: uncleared.polygons,
        })
    }

    /// Clear every connected component of `area` with `tool`.
    fn clear_area(
        &self,
        tool_index: usize,
        tool_count: usize,
        tool: &Tool,
        area: &MultiPolygon,
    ) -> ClearingResult<ToolPass> {
        let strategy = strategy_for(tool.params.method);
        let options = ClearOptions::from_params(&tool.params, self.job.progressive);
        let components = &area.0;
        let total = components.len();
        let done = AtomicUsize::new(0);
        let cancel = self.cancel;
        let progress = self.progress;

        let clear_one = |polygon: &Polygon| -> ClearingResult<Vec<LineString>> {
            if cancel.is_cancelled() {
                return Err(ClearingError::Cancelled);
            }
            let result = strategy.clear(polygon, tool.diameter, tool.params.overlap, &options);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.percent(percent(tool_index, tool_count, n, total));
            if options.progressive {
                if let Ok(paths) = &result {
                    progress.preview(tool.id.value(), &flatten(paths));
                }
            }
            result
        };

        let results: Vec<ClearingResult<Vec<LineString>>> = if self.job.parallel {
            components.par_iter().map(&clear_one).collect()
        } else {
            components.iter().map(&clear_one).collect()
        };

        let mut pass = ToolPass {
            paths: Vec::new(),
            failed: Vec::new(),
        };
        for (polygon, result) in components.iter().zip(results) {
            match result {
                Ok(paths) if !paths.is_empty() => pass.paths.extend(paths),
                Ok(_) => pass.failed.push(polygon.clone()),
                Err(ClearingError::Cancelled) => return Err(ClearingError::Cancelled),
                Err(err) if err.is_recoverable() => {
                    debug!("Tool {}: {}", tool.id, err);
                    pass.failed.push(polygon.clone());
                }
                Err(err) => return Err(err),
            }
        }
        self.check_cancel()?;
        Ok(pass)
    }

    fn record(
        &self,
        results: &mut BTreeMap<ToolId, ToolResult>,
        tool: &Tool,
        paths: Vec<LineString>,
        cleared: MultiPolygon,
    ) {
        info!(
            "Tool {} (dia {}): {} path(s), cleared {:.4}",
            tool.id,
            tool.diameter,
            paths.len(),
            geometry::area(&cleared)
        );
        results.insert(
            tool.id,
            ToolResult {
                tool: tool.clone(),
                paths,
                cleared,
            },
        );
    }

    /// Independent tools. Each tool claims the part of the empty area its
    /// staggered offset allows, minus what earlier tools claimed.
    fn single_pass(
        &mut self,
        empty: &MultiPolygon,
        tools: &[Tool],
        results: &mut BTreeMap<ToolId, ToolResult>,
    ) -> ClearingResult<Uncleared> {
        let mut uncleared = Uncleared::default();
        let mut offset: f64 = tools.iter().map(|t| t.diameter).sum();
        let mut claimed = geometry::empty();

        for (i, tool) in tools.iter().enumerate() {
            self.check_cancel()?;
            self.transition(RunState::ClearingTool(i));
            self.progress
                .status(&format!("Clearing with tool {} (dia {})", tool.id, tool.diameter));

            offset -= tool.diameter;
            let reach = offset.max(0.0);
            let area = geometry::difference(&geometry::buffer(empty, -reach), &claimed);
            if geometry::is_empty(&area) {
                debug!("Tool {}: nothing left to clear", tool.id);
                continue;
            }

            let pass = self.clear_area(i, tools.len(), tool, &area)?;
            if !pass.failed.is_empty() {
                warn!(
                    "Tool {}: {} polygon(s) could not be cleared",
                    tool.id,
                    pass.failed.len()
                );
                uncleared.polygons += pass.failed.len();
            }
            if pass.paths.is_empty() {
                continue;
            }

            // closing with a slightly wider tool keeps zero-width slivers out
            let grown = geometry::buffer(empty, -reach * (1.0 + tool.params.overlap));
            claimed = geometry::open(&grown, tool.diameter * (1.0 + 1e-6));

            let cleared =
                geometry::intersection(&geometry::sweep(&pass.paths, tool.diameter), empty);
            self.record(results, tool, pass.paths, cleared);
        }
        Ok(uncleared)
    }

    /// Largest tool first. What a tool leaves behind, including every
    /// polygon it could not clear, is grown by the next tool's diameter into
    /// the empty area so the smaller tool has room to reach into it.
    fn rest_machining(
        &mut self,
        empty: &MultiPolygon,
        tools: &[Tool],
        results: &mut BTreeMap<ToolId, ToolResult>,
    ) -> ClearingResult<Uncleared> {
        // isolation-only job: nothing was asked to be cleared
        let Some(last) = tools.last() else {
            return Ok(Uncleared::default());
        };
        let mut area = empty.clone();
        let mut rest: Vec<Polygon> = Vec::new();
        let mut swept_all = Vec::new();

        for (i, tool) in tools.iter().enumerate() {
            self.check_cancel()?;
            self.transition(RunState::ClearingTool(i));
            self.progress
                .status(&format!("Rest machining with tool {} (dia {})", tool.id, tool.diameter));

            if i > 0 {
                let carried = MultiPolygon::new(std::mem::take(&mut rest));
                let leftover = geometry::union_all([area, carried]);
                area = geometry::intersection(&geometry::buffer(&leftover, tool.diameter), empty);
            }
            if geometry::is_empty(&area) {
                debug!("Tool {}: nothing left to clear", tool.id);
                continue;
            }

            let pass = self.clear_area(i, tools.len(), tool, &area)?;
            if !pass.failed.is_empty() {
                debug!(
                    "Tool {}: {} polygon(s) carried to the next tool",
                    tool.id,
                    pass.failed.len()
                );
            }
            rest.extend(pass.failed);
            if pass.paths.is_empty() {
                continue;
            }

            let swept = geometry::intersection(&geometry::sweep(&pass.paths, tool.diameter), &area);
            // seams along the swept boundary are not material
            area = geometry::open(&geometry::difference(&area, &swept), tool.diameter * 1e-3);
            swept_all.push(swept.clone());
            self.record(results, tool, pass.paths, swept);
        }

        // corners narrower than the last tool are the round cutter's own
        // fillets; anything farther away was never reached
        let leftover = geometry::union_all([area, MultiPolygon::new(rest)]);
        let unreached = geometry::difference(
            &leftover,
            &geometry::buffer(&geometry::union_all(swept_all), last.radius()),
        );
        if !geometry::is_empty(&unreached) {
            warn!(
                "{} polygon(s) left uncleared after the last tool",
                unreached.0.len()
            );
        }
        Ok(Uncleared {
            polygons: unreached.0.len(),
        })
    }
}

/// Run one clearing job. Synchronous; the caller picks the thread.
pub fn run_clearing(
    job: &ClearingJob,
    objects: &dyn TargetAccessor,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> RunOutcome {
    NonCopperClearing::new(job, objects, cancel, progress).run()
}
