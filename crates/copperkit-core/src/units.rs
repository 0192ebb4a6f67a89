//! Length units and rounding helpers
//!
//! Tool diameters are stored in document units. Every diameter comparison
//! goes through [`round_to`] so a stored value and a looked-up value that
//! differ only by float noise compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement system of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl MeasurementSystem {
    /// Decimal places used for lengths when the document does not say otherwise.
    pub fn default_decimals(self) -> u32 {
        match self {
            Self::Metric => 4,
            Self::Imperial => 5,
        }
    }
}

impl Default for MeasurementSystem {
    fn default() -> Self {
        Self::Metric
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Whether two lengths are equal at the given precision.
pub fn same_length(a: f64, b: f64, decimals: u32) -> bool {
    round_to(a, decimals) == round_to(b, decimals)
}

/// Format a length for log and report output.
pub fn format_length(value: f64, system: MeasurementSystem, decimals: u32) -> String {
    let suffix = match system {
        MeasurementSystem::Metric => "mm",
        MeasurementSystem::Imperial => "in",
    };
    format!("{:.*} {}", decimals as usize, value, suffix)
}
