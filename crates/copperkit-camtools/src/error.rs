//! Error types for the clearing engine.
//!
//! Region and empty-area failures abort a run. [`ClearingError::UnclearableGeometry`]
//! is recovered per polygon by the orchestrator. Cancellation is reported as
//! a run status, never as a partial result.

use thiserror::Error;

/// Errors that can occur during a clearing run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClearingError {
    /// A required object is missing.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The reference object is of a kind the region builder cannot use.
    #[error("Unsupported reference kind: {kind}")]
    UnsupportedReferenceKind { kind: String },

    /// Nothing is left to clear once protected copper is removed.
    #[error("Could not get extent to clear: {0}")]
    EmptyExtent(String),

    /// No pass of the given tool fits inside a polygon.
    #[error("Polygon cannot be cleared with a {diameter} tool")]
    UnclearableGeometry { diameter: f64 },

    /// Every tool failed to produce geometry.
    #[error("No tool produced any geometry")]
    NoGeometryProduced,

    /// The host requested an abort.
    #[error("Clearing cancelled")]
    Cancelled,

    /// Invalid parameters were provided to the engine.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl ClearingError {
    /// Whether this failure comes from the boundary source.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidReference(_) | Self::UnsupportedReferenceKind { .. }
        )
    }

    /// Whether the orchestrator recovers from this failure locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnclearableGeometry { .. })
    }
}

/// Result type alias for clearing operations.
pub type ClearingResult<T> = Result<T, ClearingError>;
