//! Pass generation strategies for copper clearing.
//!
//! Each strategy turns one connected polygon plus a tool into an ordered list
//! of cutting paths. All of them work on the tool-centre region (the polygon
//! inset by the tool radius) so no path can gouge the polygon's boundary.

mod lines;
mod seed;
mod standard;

pub use lines::Lines;
pub use seed::Seed;
pub use standard::Standard;

use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use copperkit_core::{ClearingMethod, ClearingParams, MillingDirection};
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Options shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOptions {
    /// Finish with a pass along the tool-centre boundary.
    pub contour: bool,
    /// Join consecutive passes when the connector stays inside.
    pub connect: bool,
    /// Report each polygon's passes as they are produced.
    pub progressive: bool,
    pub milling: MillingDirection,
}

impl ClearOptions {
    pub fn from_params(params: &ClearingParams, progressive: bool) -> Self {
        Self {
            contour: params.contour,
            connect: params.connect,
            progressive,
            milling: params.milling,
        }
    }
}

impl Default for ClearOptions {
    fn default() -> Self {
        Self::from_params(&ClearingParams::default(), false)
    }
}

/// A pass generation algorithm.
pub trait PassStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Paths clearing `polygon` with a tool of `diameter`.
    ///
    /// Fails with [`ClearingError::UnclearableGeometry`] when the tool does
    /// not fit anywhere inside the polygon.
    fn clear(
        &self,
        polygon: &Polygon,
        diameter: f64,
        overlap: f64,
        options: &ClearOptions,
    ) -> ClearingResult<Vec<LineString>>;
}

/// Strategy implementing `method`.
pub fn strategy_for(method: ClearingMethod) -> &'static dyn PassStrategy {
    match method {
        ClearingMethod::Standard => &Standard,
        ClearingMethod::Seed => &Seed,
        ClearingMethod::Lines => &Lines,
    }
}

/// Distance between passes, validating the inputs.
pub(crate) fn pass_step(diameter: f64, overlap: f64) -> ClearingResult<f64> {
    if !diameter.is_finite() || diameter <= 0.0 {
        return Err(ClearingError::InvalidParameters(format!(
            "tool diameter {} must be positive",
            diameter
        )));
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(ClearingError::InvalidParameters(format!(
            "overlap {} is outside [0, 1)",
            overlap
        )));
    }
    Ok(diameter * (1.0 - overlap))
}

/// Polygon inset by the tool radius.
pub(crate) fn tool_centre_region(polygon: &Polygon, diameter: f64) -> ClearingResult<MultiPolygon> {
    let inset = geometry::buffer(&geometry::to_multi(polygon.clone()), -diameter / 2.0);
    if geometry::is_empty(&inset) {
        return Err(ClearingError::UnclearableGeometry { diameter });
    }
    Ok(inset)
}

/// Area connectors may cross. Slightly larger than the tool-centre region so
/// links starting on its boundary are accepted.
pub(crate) fn connect_area(region: &MultiPolygon, diameter: f64) -> MultiPolygon {
    geometry::buffer(region, diameter * 1e-3)
}

fn rotate_ring(ring: LineString, start: usize) -> LineString {
    if ring.0.len() < 2 {
        return ring;
    }
    let n = ring.0.len() - 1;
    if start == 0 || start >= n {
        return ring;
    }
    let open = &ring.0[..n];
    let mut coords = Vec::with_capacity(n + 1);
    coords.extend_from_slice(&open[start..]);
    coords.extend_from_slice(&open[..start]);
    coords.push(open[start]);
    LineString::new(coords)
}

/// Greedy nearest-neighbour ordering starting at `start`.
///
/// Closed rings are rotated to begin at their vertex nearest the current
/// position; open paths may be reversed.
pub(crate) fn order_paths(mut remaining: Vec<LineString>, start: Coord) -> Vec<LineString> {
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut pos = start;

    while !remaining.is_empty() {
        let mut best = (0usize, 0usize, false, f64::INFINITY);
        for (i, path) in remaining.iter().enumerate() {
            if path.is_closed() && path.0.len() > 3 {
                for (j, c) in path.0[..path.0.len() - 1].iter().enumerate() {
                    let d = geometry::distance(pos, *c);
                    if d < best.3 {
                        best = (i, j, false, d);
                    }
                }
            } else if let (Some(first), Some(last)) = (path.0.first(), path.0.last()) {
                let d_first = geometry::distance(pos, *first);
                let d_last = geometry::distance(pos, *last);
                if d_first < best.3 {
                    best = (i, 0, false, d_first);
                }
                if d_last < best.3 {
                    best = (i, 0, true, d_last);
                }
            }
        }

        let (index, vertex, reverse, _) = best;
        let mut path = remaining.swap_remove(index);
        if path.is_closed() {
            path = rotate_ring(path, vertex);
        } else if reverse {
            path.0.reverse();
        }
        if let Some(last) = path.0.last() {
            pos = *last;
        }
        ordered.push(path);
    }
    ordered
}

fn link_inside(a: Coord, b: Coord, allowed: &MultiPolygon) -> bool {
    let link = geometry::distance(a, b);
    if link <= geometry::MIN_LENGTH {
        return true;
    }
    let pieces = geometry::clip_lines(&[LineString::new(vec![a, b])], allowed);
    let kept: f64 = pieces.iter().map(geometry::length).sum();
    pieces.len() == 1 && kept >= link * (1.0 - 1e-6)
}

/// Join consecutive paths with straight connectors.
///
/// A connector is used when it is at most two tool diameters long and lies
/// inside `allowed`.
pub(crate) fn connect_paths(
    paths: Vec<LineString>,
    allowed: &MultiPolygon,
    diameter: f64,
) -> Vec<LineString> {
    let max_link = 2.0 * diameter;
    let mut joined: Vec<LineString> = Vec::with_capacity(paths.len());

    for path in paths {
        let next_start = path.0.first().copied();
        if let (Some(prev), Some(next_start)) = (joined.last_mut(), next_start) {
            if let Some(&prev_end) = prev.0.last() {
                let link = geometry::distance(prev_end, next_start);
                if link <= max_link && link_inside(prev_end, next_start, allowed) {
                    let skip = usize::from(link <= geometry::MIN_LENGTH);
                    prev.0.extend(path.0.into_iter().skip(skip));
                    continue;
                }
            }
        }
        joined.push(path);
    }
    joined
}

/// Apply the milling direction and drop degenerate paths.
pub(crate) fn finish_paths(mut paths: Vec<LineString>, milling: MillingDirection) -> Vec<LineString> {
    paths.retain(|p| p.0.len() >= 2 && geometry::length(p) > geometry::MIN_LENGTH);
    if milling == MillingDirection::Climb {
        for path in &mut paths {
            path.0.reverse();
        }
    }
    paths
}

/// Contour rings of the tool-centre region, ordered from `pos`.
pub(crate) fn contour_rings(region: &MultiPolygon, pos: Coord) -> Vec<LineString> {
    order_paths(geometry::rings(region), pos)
}

pub(crate) fn last_position(paths: &[LineString], fallback: Coord) -> Coord {
    paths
        .last()
        .and_then(|p| p.0.last().copied())
        .unwrap_or(fallback)
}
