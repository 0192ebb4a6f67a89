//! Error handling for CopperKit core
//!
//! Provides the error type raised by the tool catalog.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Tool catalog error type
///
/// Raised when a catalog mutation would break one of its invariants.
/// A failed mutation always leaves the catalog unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// A tool with the same (rounded) diameter already exists
    #[error("Tool diameter {diameter} already in the catalog")]
    DuplicateDiameter {
        /// The rejected diameter, rounded to catalog precision.
        diameter: f64,
    },

    /// Diameter is zero, negative or not finite
    #[error("Invalid tool diameter: {diameter}")]
    InvalidDiameter {
        /// The rejected diameter.
        diameter: f64,
    },

    /// A clearing parameter is outside its valid range
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No tool with the given id
    #[error("Unknown tool id: {id}")]
    UnknownTool {
        /// The id that was looked up.
        id: u64,
    },
}
