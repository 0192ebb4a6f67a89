//! Region builder
//!
//! Derives the working boundary of a clearing run from its reference mode
//! and grows it by the margin. Margins use mitre joins so rectangular boards
//! keep their corners.
//!
//! In area mode every shape is grown on its own before the union, so two
//! shapes only fuse when their grown outlines overlap.

use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use copperkit_core::ReferenceMode;
use geo::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Kind of a named object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Copper artwork (a Gerber layer)
    Artwork,
    /// Generic path geometry
    Path,
    /// Closed area geometry
    Area,
    /// Drill hits, unusable as a boundary
    Drill,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artwork => write!(f, "Artwork"),
            Self::Path => write!(f, "Path"),
            Self::Area => write!(f, "Area"),
            Self::Drill => write!(f, "Drill"),
        }
    }
}

/// Named object with solid geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetObject {
    pub name: String,
    pub kind: ObjectKind,
    pub geometry: MultiPolygon,
}

impl TargetObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, geometry: MultiPolygon) -> Self {
        Self {
            name: name.into(),
            kind,
            geometry,
        }
    }
}

/// Lookup of objects by name
pub trait TargetAccessor {
    fn object(&self, name: &str) -> Option<&TargetObject>;
}

/// In-memory object store
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: BTreeMap<String, TargetObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, replacing any object with the same name.
    pub fn insert(&mut self, object: TargetObject) {
        self.objects.insert(object.name.clone(), object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl TargetAccessor for ObjectStore {
    fn object(&self, name: &str) -> Option<&TargetObject> {
        self.objects.get(name)
    }
}

fn self_envelope(target: &TargetObject) -> ClearingResult<MultiPolygon> {
    let geom = &target.geometry;
    match geom.0.as_slice() {
        [] => Err(ClearingError::InvalidReference(format!(
            "object '{}' has no geometry",
            target.name
        ))),
        [single] => Ok(geometry::to_multi(Polygon::new(
            single.exterior().clone(),
            vec![],
        ))),
        _ => Ok(geometry::to_multi(geometry::convex_hull(geom))),
    }
}

/// Build the clearing boundary.
///
/// `reference` is required in [`ReferenceMode::Reference`] and `area_shapes`
/// in [`ReferenceMode::Area`]; each is ignored in the other modes.
pub fn build_region(
    mode: ReferenceMode,
    target: &TargetObject,
    reference: Option<&TargetObject>,
    area_shapes: &[Polygon],
    margin: f64,
) -> ClearingResult<MultiPolygon> {
    if !margin.is_finite() {
        return Err(ClearingError::InvalidParameters(format!(
            "margin {} is not finite",
            margin
        )));
    }

    let region = match mode {
        ReferenceMode::SelfTarget => {
            let envelope = self_envelope(target)?;
            geometry::buffer_mitre(&envelope, margin)
        }
        ReferenceMode::Area => {
            if area_shapes.is_empty() {
                return Err(ClearingError::InvalidReference(
                    "no area shapes selected".to_string(),
                ));
            }
            geometry::union_all(
                area_shapes
                    .iter()
                    .map(|shape| geometry::buffer_mitre(&geometry::to_multi(shape.clone()), margin)),
            )
        }
        ReferenceMode::Reference => {
            let reference = reference.ok_or_else(|| {
                ClearingError::InvalidReference("no reference object".to_string())
            })?;
            match reference.kind {
                ObjectKind::Path | ObjectKind::Area => geometry::union_all(
                    reference
                        .geometry
                        .iter()
                        .map(|part| geometry::buffer_mitre(&geometry::to_multi(part.clone()), margin)),
                ),
                ObjectKind::Artwork => {
                    if reference.geometry.0.is_empty() || target.geometry.0.is_empty() {
                        return Err(ClearingError::InvalidReference(format!(
                            "object '{}' has no geometry",
                            reference.name
                        )));
                    }
                    let own = geometry::to_multi(geometry::convex_hull(&target.geometry));
                    let other = geometry::to_multi(geometry::convex_hull(&reference.geometry));
                    geometry::buffer_mitre(&geometry::intersection(&own, &other), margin)
                }
                ObjectKind::Drill => {
                    return Err(ClearingError::UnsupportedReferenceKind {
                        kind: reference.kind.to_string(),
                    })
                }
            }
        }
    };

    debug!(
        "Region for {} mode: {} polygon(s), area {:.4}",
        mode,
        region.0.len(),
        geometry::area(&region)
    );
    if geometry::is_empty(&region) {
        return Err(ClearingError::EmptyExtent(
            "clearing boundary is empty".to_string(),
        ));
    }
    Ok(region)
}
