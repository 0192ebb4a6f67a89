//! # CopperKit Core
//!
//! Core types shared by the CopperKit crates:
//! the tool catalog consumed by the clearing engine, the per-tool
//! clearing parameter schema, run-control primitives (cancellation and
//! progress reporting) and length/rounding helpers.

pub mod data;
pub mod error;
pub mod types;
pub mod units;

pub use data::reference::ReferenceMode;
pub use data::tools::{
    ClearingMethod, ClearingParams, MillingDirection, OperationKind, ParamOverrides, Tool,
    ToolCatalog, ToolId, ToolOrder, ToolShape,
};

pub use error::ToolError;

pub use types::{CancellationToken, NullProgress, ProgressSink};
