//! JSON report of a clearing run

use copperkit_camtools::{geometry, RunOutcome, RunStatus, ToolResult};
use geo::LineString;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    pub id: u64,
    pub diameter: f64,
    pub shape: String,
    pub operation: String,
    pub method: String,
    pub cleared_area: f64,
    pub paths: Vec<LineString>,
}

impl From<&ToolResult> for ToolReport {
    fn from(result: &ToolResult) -> Self {
        let tool = &result.tool;
        Self {
            id: tool.id.value(),
            diameter: tool.diameter,
            shape: tool.shape.to_string(),
            operation: tool.params.operation.to_string(),
            method: tool.params.method.to_string(),
            cleared_area: geometry::area(&result.cleared),
            paths: result.paths.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output_name: String,
    /// `done`, `failed` or `cancelled`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: usize,
    pub not_cleared: bool,
    pub uncleared_count: usize,
    pub cleared_area: f64,
    pub tools: Vec<ToolReport>,
}

impl From<&RunOutcome> for RunReport {
    fn from(outcome: &RunOutcome) -> Self {
        let (status, error) = match &outcome.status {
            RunStatus::Done => ("done", None),
            RunStatus::Failed(err) => ("failed", Some(err.to_string())),
            RunStatus::Cancelled => ("cancelled", None),
        };
        Self {
            output_name: outcome.output_name.clone(),
            status,
            error,
            warnings: outcome.warnings,
            not_cleared: outcome.not_cleared,
            uncleared_count: outcome.uncleared_count,
            cleared_area: outcome.cleared_area(),
            tools: outcome.tools.values().map(ToolReport::from).collect(),
        }
    }
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_done(&self) -> bool {
        self.status == "done"
    }
}
