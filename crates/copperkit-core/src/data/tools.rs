//! Tool catalog module - tool definitions and catalog management
//!
//! This module provides:
//! - Tool shapes and the per-tool clearing parameter schema
//! - Explicit inheritance of catalog defaults through [`ParamOverrides`]
//! - The [`ToolCatalog`] (add, edit, remove, bulk apply, ordered snapshots)
//!
//! Diameters are unique within a catalog at the catalog's rounding
//! precision. A rejected mutation leaves the catalog untouched.

use crate::error::ToolError;
use crate::units::{round_to, same_length};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Opaque tool identifier, monotonic within one catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ToolId(u64);

impl ToolId {
    /// Raw numeric value, for reports and progress previews.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Cutting tip geometry. Informational for clearing, only the diameter matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolShape {
    /// Flat end mill
    Flat,
    /// V-shaped engraving bit
    VShape,
    /// Ball nose
    Ball,
}

impl Default for ToolShape {
    fn default() -> Self {
        Self::Flat
    }
}

impl fmt::Display for ToolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "Flat"),
            Self::VShape => write!(f, "V-Shape"),
            Self::Ball => write!(f, "Ball"),
        }
    }
}

impl FromStr for ToolShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" | "c1" => Ok(Self::Flat),
            "v" | "vshape" | "v_shape" | "v-shape" => Ok(Self::VShape),
            "ball" | "b" => Ok(Self::Ball),
            _ => Err(format!("Unknown tool shape: {}", s)),
        }
    }
}

/// What a tool does during a clearing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Area clearing passes
    Clear,
    /// Isolation ring around the protected copper
    Isolation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "Clear"),
            Self::Isolation => write!(f, "Isolation"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "isolation" | "iso" => Ok(Self::Isolation),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

/// Pass generation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClearingMethod {
    /// Fixed-step inward offsetting
    Standard,
    /// Concentric growth from a seed point
    Seed,
    /// Parallel raster lines
    Lines,
}

impl ClearingMethod {
    /// All methods, in presentation order.
    pub fn all() -> &'static [ClearingMethod] {
        &[Self::Standard, Self::Seed, Self::Lines]
    }
}

impl fmt::Display for ClearingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::Seed => write!(f, "Seed"),
            Self::Lines => write!(f, "Lines"),
        }
    }
}

impl FromStr for ClearingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "seed" => Ok(Self::Seed),
            "lines" => Ok(Self::Lines),
            _ => Err(format!("Unknown clearing method: {}", s)),
        }
    }
}

/// Cutting direction relative to the material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MillingDirection {
    /// Climb milling, paths run with reversed winding
    Climb,
    /// Conventional milling, paths keep their generated winding
    Conventional,
}

impl fmt::Display for MillingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Climb => write!(f, "Climb"),
            Self::Conventional => write!(f, "Conventional"),
        }
    }
}

impl FromStr for MillingDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "climb" | "cl" => Ok(Self::Climb),
            "conventional" | "cv" => Ok(Self::Conventional),
            _ => Err(format!("Unknown milling direction: {}", s)),
        }
    }
}

/// Order in which single-pass clearing visits the tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolOrder {
    /// Catalog (table) order
    Table,
    /// Smallest diameter first
    Ascending,
    /// Largest diameter first
    Descending,
}

impl Default for ToolOrder {
    fn default() -> Self {
        Self::Descending
    }
}

impl FromStr for ToolOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "default" | "no" => Ok(Self::Table),
            "ascending" | "fwd" => Ok(Self::Ascending),
            "descending" | "rev" => Ok(Self::Descending),
            _ => Err(format!("Unknown tool order: {}", s)),
        }
    }
}

/// Clearing parameters carried by every tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingParams {
    /// Fraction of the diameter shared by adjacent passes, in `[0, 1)`
    pub overlap: f64,
    /// Clearing or isolation
    pub operation: OperationKind,
    /// Pass generation method
    pub method: ClearingMethod,
    /// Join consecutive passes to avoid tool lifts
    pub connect: bool,
    /// Finish with a pass along the boundary
    pub contour: bool,
    /// Extra clearance kept around protected copper
    pub copper_offset: Option<f64>,
    /// Climb or conventional
    pub milling: MillingDirection,
}

impl Default for ClearingParams {
    fn default() -> Self {
        Self {
            overlap: 0.4,
            operation: OperationKind::Clear,
            method: ClearingMethod::Standard,
            connect: true,
            contour: true,
            copper_offset: None,
            milling: MillingDirection::Climb,
        }
    }
}

impl ClearingParams {
    /// Check ranges.
    pub fn validate(&self) -> Result<(), ToolError> {
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ToolError::InvalidParameter {
                name: "overlap".to_string(),
                reason: format!("{} is outside [0, 1)", self.overlap),
            });
        }
        if let Some(offset) = self.copper_offset {
            if !offset.is_finite() || offset < 0.0 {
                return Err(ToolError::InvalidParameter {
                    name: "copper_offset".to_string(),
                    reason: format!("{} must be a non-negative distance", offset),
                });
            }
        }
        Ok(())
    }

    /// These parameters with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &ParamOverrides) -> Self {
        Self {
            overlap: overrides.overlap.unwrap_or(self.overlap),
            operation: overrides.operation.unwrap_or(self.operation),
            method: overrides.method.unwrap_or(self.method),
            connect: overrides.connect.unwrap_or(self.connect),
            contour: overrides.contour.unwrap_or(self.contour),
            copper_offset: overrides.copper_offset.or(self.copper_offset),
            milling: overrides.milling.unwrap_or(self.milling),
        }
    }

    /// Distance between adjacent passes for a tool of `diameter`.
    pub fn step(&self, diameter: f64) -> f64 {
        diameter * (1.0 - self.overlap)
    }
}

/// Per-tool deviations from the catalog defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    pub overlap: Option<f64>,
    pub operation: Option<OperationKind>,
    pub method: Option<ClearingMethod>,
    pub connect: Option<bool>,
    pub contour: Option<bool>,
    pub copper_offset: Option<f64>,
    pub milling: Option<MillingDirection>,
}

/// Complete tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Catalog identifier
    pub id: ToolId,
    /// Cutting diameter in document units
    pub diameter: f64,
    /// Tip geometry
    pub shape: ToolShape,
    /// Clearing parameters, already merged with the catalog defaults
    pub params: ClearingParams,
}

impl Tool {
    /// Half the diameter.
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Distance between adjacent passes.
    pub fn step(&self) -> f64 {
        self.params.step(self.diameter)
    }

    /// Whether this tool cuts isolation rings instead of clearing.
    pub fn is_isolation(&self) -> bool {
        self.params.operation == OperationKind::Isolation
    }

    /// Get a descriptive string for the tool
    pub fn description_short(&self) -> String {
        format!(
            "{} {} dia {}, {} {}",
            self.id, self.shape, self.diameter, self.params.operation, self.params.method
        )
    }
}

/// Effective cutting width of a V-shaped bit at a given depth.
pub fn vshape_diameter(tip_diameter: f64, tip_angle_deg: f64, cut_depth: f64) -> f64 {
    let half_angle = (tip_angle_deg / 2.0).to_radians();
    tip_diameter + 2.0 * cut_depth.abs() * half_angle.tan()
}

/// Tool catalog - ordered collection of tools with unique diameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalog {
    /// Tools in table order
    tools: Vec<Tool>,
    /// Next identifier handed out
    next_id: u64,
    /// Decimal places used for diameter comparison
    decimals: u32,
    /// Parameters new tools inherit
    defaults: ClearingParams,
}

impl ToolCatalog {
    /// Create an empty catalog.
    pub fn new(defaults: ClearingParams, decimals: u32) -> Self {
        Self {
            tools: Vec::new(),
            next_id: 1,
            decimals,
            defaults,
        }
    }

    /// Decimal places used for diameter comparison.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Parameters new tools inherit.
    pub fn defaults(&self) -> &ClearingParams {
        &self.defaults
    }

    fn checked_diameter(&self, diameter: f64, except: Option<ToolId>) -> Result<f64, ToolError> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(ToolError::InvalidDiameter { diameter });
        }
        let rounded = round_to(diameter, self.decimals);
        if rounded <= 0.0 {
            return Err(ToolError::InvalidDiameter { diameter });
        }
        let clash = self
            .tools
            .iter()
            .filter(|t| Some(t.id) != except)
            .any(|t| same_length(t.diameter, rounded, self.decimals));
        if clash {
            return Err(ToolError::DuplicateDiameter { diameter: rounded });
        }
        Ok(rounded)
    }

    /// Add a tool from a manually entered diameter.
    pub fn add_tool(
        &mut self,
        diameter: f64,
        shape: ToolShape,
        overrides: &ParamOverrides,
    ) -> Result<ToolId, ToolError> {
        let diameter = self.checked_diameter(diameter, None)?;
        let params = self.defaults.merged(overrides);
        params.validate()?;

        let id = ToolId(self.next_id);
        self.next_id += 1;
        self.tools.push(Tool {
            id,
            diameter,
            shape,
            params,
        });
        debug!("Added tool {} with diameter {}", id, diameter);
        Ok(id)
    }

    /// Add a V-shaped tool whose diameter is its cutting width at `cut_depth`.
    pub fn add_vshape_tool(
        &mut self,
        tip_diameter: f64,
        tip_angle_deg: f64,
        cut_depth: f64,
        overrides: &ParamOverrides,
    ) -> Result<ToolId, ToolError> {
        if !(tip_angle_deg > 0.0 && tip_angle_deg < 180.0) {
            return Err(ToolError::InvalidParameter {
                name: "tip_angle".to_string(),
                reason: format!("{} is outside (0, 180)", tip_angle_deg),
            });
        }
        if tip_diameter < 0.0 {
            return Err(ToolError::InvalidParameter {
                name: "tip_diameter".to_string(),
                reason: format!("{} is negative", tip_diameter),
            });
        }
        let diameter = vshape_diameter(tip_diameter, tip_angle_deg, cut_depth);
        self.add_tool(diameter, ToolShape::VShape, overrides)
    }

    /// Get a tool by ID
    pub fn get(&self, id: ToolId) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Find the tool with the given diameter at catalog precision.
    pub fn find_by_diameter(&self, diameter: f64) -> Option<&Tool> {
        self.tools
            .iter()
            .find(|t| same_length(t.diameter, diameter, self.decimals))
    }

    /// Change a tool's diameter. Rejected if another tool already has it.
    pub fn edit_diameter(&mut self, id: ToolId, diameter: f64) -> Result<(), ToolError> {
        let diameter = self.checked_diameter(diameter, Some(id))?;
        let tool = self
            .tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ToolError::UnknownTool { id: id.0 })?;
        tool.diameter = diameter;
        Ok(())
    }

    /// Replace one tool's parameters.
    pub fn set_params(&mut self, id: ToolId, params: ClearingParams) -> Result<(), ToolError> {
        params.validate()?;
        let tool = self
            .tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ToolError::UnknownTool { id: id.0 })?;
        tool.params = params;
        Ok(())
    }

    /// Copy `params` onto every tool.
    pub fn apply_params_to_all(&mut self, params: &ClearingParams) -> Result<(), ToolError> {
        params.validate()?;
        for tool in &mut self.tools {
            tool.params = params.clone();
        }
        Ok(())
    }

    /// Put every tool back on the catalog defaults.
    pub fn reset_params(&mut self) {
        for tool in &mut self.tools {
            tool.params = self.defaults.clone();
        }
    }

    /// Remove a tool from the catalog
    pub fn remove_tool(&mut self, id: ToolId) -> Option<Tool> {
        let index = self.tools.iter().position(|t| t.id == id)?;
        Some(self.tools.remove(index))
    }

    /// Remove several tools, returning how many were present.
    pub fn remove_tools(&mut self, ids: &[ToolId]) -> usize {
        let before = self.tools.len();
        self.tools.retain(|t| !ids.contains(&t.id));
        before - self.tools.len()
    }

    /// Remove every tool. Identifiers keep increasing afterwards.
    pub fn clear(&mut self) {
        self.tools.clear();
    }

    /// Tools in table order.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Read-only copy of the tools in the requested order, for one run.
    pub fn snapshot(&self, order: ToolOrder) -> Vec<Tool> {
        let mut tools = self.tools.clone();
        sort_tools(&mut tools, order);
        tools
    }

    /// Get the number of tools in the catalog
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new(ClearingParams::default(), 4)
    }
}

/// Sort tools in place. Table order leaves them untouched.
pub fn sort_tools(tools: &mut [Tool], order: ToolOrder) {
    match order {
        ToolOrder::Table => {}
        ToolOrder::Ascending => tools.sort_by(|a, b| a.diameter.total_cmp(&b.diameter)),
        ToolOrder::Descending => tools.sort_by(|a, b| b.diameter.total_cmp(&a.diameter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(ClearingParams::default(), 4)
    }

    #[test]
    fn test_add_assigns_monotonic_ids() {
        let mut cat = catalog();
        let a = cat.add_tool(1.0, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        let b = cat.add_tool(0.5, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        assert!(b > a);

        cat.remove_tool(b);
        let c = cat.add_tool(0.25, ToolShape::Ball, &ParamOverrides::default()).unwrap();
        assert!(c > b, "ids are never reused");
    }

    #[test]
    fn test_duplicate_diameter_rejected_within_precision() {
        let mut cat = catalog();
        cat.add_tool(0.8, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        let err = cat
            .add_tool(0.80001, ToolShape::Flat, &ParamOverrides::default())
            .unwrap_err();
        assert_eq!(err, ToolError::DuplicateDiameter { diameter: 0.8 });
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn test_invalid_diameter_rejected() {
        let mut cat = catalog();
        assert!(cat.add_tool(0.0, ToolShape::Flat, &ParamOverrides::default()).is_err());
        assert!(cat.add_tool(-2.0, ToolShape::Flat, &ParamOverrides::default()).is_err());
        assert!(cat
            .add_tool(f64::NAN, ToolShape::Flat, &ParamOverrides::default())
            .is_err());
        assert!(cat.is_empty());
    }

    #[test]
    fn test_overrides_merge_with_defaults() {
        let mut cat = catalog();
        let overrides = ParamOverrides {
            method: Some(ClearingMethod::Lines),
            overlap: Some(0.2),
            ..Default::default()
        };
        let id = cat.add_tool(1.0, ToolShape::Flat, &overrides).unwrap();
        let tool = cat.get(id).unwrap();
        assert_eq!(tool.params.method, ClearingMethod::Lines);
        assert_eq!(tool.params.overlap, 0.2);
        assert_eq!(tool.params.contour, ClearingParams::default().contour);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let mut cat = catalog();
        let overrides = ParamOverrides {
            overlap: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            cat.add_tool(1.0, ToolShape::Flat, &overrides),
            Err(ToolError::InvalidParameter { .. })
        ));
        assert!(cat.is_empty());
    }

    #[test]
    fn test_vshape_diameter() {
        // 90 degree bit, 0.1 tip, 0.5 deep: 0.1 + 2 * 0.5 * tan(45)
        let d = vshape_diameter(0.1, 90.0, -0.5);
        assert!((d - 1.1).abs() < 1e-9);

        let mut cat = catalog();
        let id = cat
            .add_vshape_tool(0.1, 90.0, -0.5, &ParamOverrides::default())
            .unwrap();
        let tool = cat.get(id).unwrap();
        assert_eq!(tool.shape, ToolShape::VShape);
        assert_eq!(tool.diameter, 1.1);
        assert!(cat.add_vshape_tool(0.1, 180.0, -0.5, &ParamOverrides::default()).is_err());
    }

    #[test]
    fn test_edit_diameter() {
        let mut cat = catalog();
        let a = cat.add_tool(1.0, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        let b = cat.add_tool(0.5, ToolShape::Flat, &ParamOverrides::default()).unwrap();

        assert!(cat.edit_diameter(b, 1.0).is_err());
        assert_eq!(cat.get(b).unwrap().diameter, 0.5);

        cat.edit_diameter(a, 1.0).unwrap();
        cat.edit_diameter(b, 0.6).unwrap();
        assert_eq!(cat.get(b).unwrap().diameter, 0.6);
        assert!(cat.find_by_diameter(0.60001).is_some());
    }

    #[test]
    fn test_apply_and_reset_params() {
        let mut cat = catalog();
        cat.add_tool(1.0, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        cat.add_tool(0.5, ToolShape::Flat, &ParamOverrides::default()).unwrap();

        let seed = ClearingParams {
            method: ClearingMethod::Seed,
            ..Default::default()
        };
        cat.apply_params_to_all(&seed).unwrap();
        assert!(cat.tools().iter().all(|t| t.params.method == ClearingMethod::Seed));

        cat.reset_params();
        assert!(cat
            .tools()
            .iter()
            .all(|t| t.params == ClearingParams::default()));
    }

    #[test]
    fn test_snapshot_orders() {
        let mut cat = catalog();
        for d in [0.5, 2.0, 1.0] {
            cat.add_tool(d, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        }
        let diam = |order| -> Vec<f64> {
            cat.snapshot(order).iter().map(|t| t.diameter).collect()
        };
        assert_eq!(diam(ToolOrder::Table), vec![0.5, 2.0, 1.0]);
        assert_eq!(diam(ToolOrder::Ascending), vec![0.5, 1.0, 2.0]);
        assert_eq!(diam(ToolOrder::Descending), vec![2.0, 1.0, 0.5]);
    }

    #[test]
    fn test_bulk_remove() {
        let mut cat = catalog();
        let a = cat.add_tool(1.0, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        let b = cat.add_tool(0.5, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        cat.add_tool(0.2, ToolShape::Flat, &ParamOverrides::default()).unwrap();
        assert_eq!(cat.remove_tools(&[a, b]), 2);
        assert_eq!(cat.len(), 1);
        cat.clear();
        assert!(cat.is_empty());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("lines".parse::<ClearingMethod>().unwrap(), ClearingMethod::Lines);
        assert_eq!("rev".parse::<ToolOrder>().unwrap(), ToolOrder::Descending);
        assert_eq!("cv".parse::<MillingDirection>().unwrap(), MillingDirection::Conventional);
        assert_eq!("iso".parse::<OperationKind>().unwrap(), OperationKind::Isolation);
        assert!("zigzag".parse::<ClearingMethod>().is_err());
    }
}
