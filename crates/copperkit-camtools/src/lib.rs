//! # CopperKit CAM Tools
//!
//! Copper clearing geometry engine. Given a target copper layer, a boundary
//! source and a list of tools, it produces per-tool cutting paths that remove
//! all copper outside the protected features.
//!
//! ## Pipeline
//!
//! - **Region**: boundary to clear, from the target itself, user drawn areas
//!   or a reference object ([`region`])
//! - **Empty area**: boundary minus protected copper, optionally isolated
//!   first ([`empty_area`])
//! - **Pass generation**: Standard, Seed and Lines strategies ([`clearing`])
//! - **Orchestration**: single-pass and rest-machining tool loops
//!   ([`orchestrator`])
//!
//! Polygon operations go through [`geometry`], a thin layer over `geo` and
//! `cavalier_contours`.

pub mod clearing;
pub mod empty_area;
pub mod error;
pub mod geometry;
pub mod orchestrator;
pub mod region;

pub use clearing::{strategy_for, ClearOptions, Lines, PassStrategy, Seed, Standard};
pub use empty_area::{compute_empty, EmptyArea, IsolationPass, IsolationRings};
pub use error::{ClearingError, ClearingResult};
pub use orchestrator::{
    run_clearing, ClearingJob, NonCopperClearing, RunOutcome, RunState, RunStatus, ToolResult,
};
pub use region::{build_region, ObjectKind, ObjectStore, TargetAccessor, TargetObject};

pub use copperkit_core::ReferenceMode;
