//! Reference modes for the clearing boundary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the clearing boundary comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Hull of the target's own copper
    #[serde(rename = "self")]
    SelfTarget,
    /// User drawn area shapes
    Area,
    /// Another named object
    Reference,
}

impl Default for ReferenceMode {
    fn default() -> Self {
        Self::SelfTarget
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfTarget => write!(f, "Itself"),
            Self::Area => write!(f, "Area Selection"),
            Self::Reference => write!(f, "Reference Object"),
        }
    }
}

impl FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "self" | "itself" => Ok(Self::SelfTarget),
            "area" | "area selection" => Ok(Self::Area),
            "reference" | "box" | "reference object" => Ok(Self::Reference),
            _ => Err(format!("Unknown reference mode: {}", s)),
        }
    }
}
