//! Empty-area calculator
//!
//! The empty area is the part of the boundary that may be cleared: the
//! region minus protected copper. When isolation tools are requested the
//! copper is first surrounded by one isolation ring per tool and the band
//! those rings sweep is protected too.

use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use copperkit_core::{MillingDirection, ToolId};
use geo::{LineString, MultiPolygon};
use tracing::{debug, warn};

/// One isolation tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationPass {
    pub tool: ToolId,
    pub diameter: f64,
    pub milling: MillingDirection,
}

/// Isolation rings produced for one tool
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationRings {
    pub tool: ToolId,
    pub diameter: f64,
    /// Rings clipped to the reachable part of the region
    pub rings: Vec<LineString>,
    /// Some ring left the region and was cut into fragments
    pub broken: bool,
}

/// Result of [`compute_empty`]
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyArea {
    pub area: MultiPolygon,
    pub isolation: Vec<IsolationRings>,
    /// Number of tools whose isolation coverage is broken
    pub warnings: usize,
}

fn isolation_rings(
    region: &MultiPolygon,
    protected: &MultiPolygon,
    pass: &IsolationPass,
) -> IsolationRings {
    let radius = pass.diameter / 2.0;
    let outline = geometry::offset_outward(protected, radius);
    // the whole tool, not just its centre, has to stay inside the region
    let reach = geometry::buffer(region, -radius);

    let mut rings = Vec::new();
    let mut broken = false;
    for ring in geometry::rings(&outline) {
        let full = geometry::length(&ring);
        let pieces = geometry::clip_lines(std::slice::from_ref(&ring), &reach);
        let kept: f64 = pieces.iter().map(geometry::length).sum();
        if pieces.len() == 1 && (full - kept).abs() <= full * 1e-6 {
            rings.push(ring);
        } else {
            broken = true;
            rings.extend(pieces);
        }
    }

    if pass.milling == MillingDirection::Climb {
        for ring in &mut rings {
            ring.0.reverse();
        }
    }

    IsolationRings {
        tool: pass.tool,
        diameter: pass.diameter,
        rings,
        broken,
    }
}

/// Compute the clearable area.
///
/// Fails with [`ClearingError::EmptyExtent`] when nothing is left.
pub fn compute_empty(
    region: &MultiPolygon,
    protected: &MultiPolygon,
    isolation: &[IsolationPass],
    copper_offset: Option<f64>,
) -> ClearingResult<EmptyArea> {
    let offset = copper_offset.filter(|o| *o > 0.0);

    let (keep_out, rings) = if isolation.is_empty() {
        let keep_out = match offset {
            Some(o) => geometry::buffer(protected, o),
            None => protected.clone(),
        };
        (keep_out, Vec::new())
    } else {
        let rings: Vec<IsolationRings> = isolation
            .iter()
            .map(|pass| isolation_rings(region, protected, pass))
            .collect();
        let envelopes = isolation
            .iter()
            .map(|pass| geometry::buffer(protected, pass.diameter));
        let mut keep_out = geometry::union_all(envelopes);
        if let Some(o) = offset {
            keep_out = geometry::buffer(&keep_out, o);
        }
        (keep_out, rings)
    };

    let warnings = rings.iter().filter(|r| r.broken).count();
    for r in rings.iter().filter(|r| r.broken) {
        warn!(
            "Isolation with tool {} (dia {}) is broken, margin smaller than tool diameter",
            r.tool, r.diameter
        );
    }

    let area = geometry::difference(region, &keep_out);
    debug!(
        "Empty area: {} polygon(s), area {:.4}, {} isolation warning(s)",
        area.0.len(),
        geometry::area(&area),
        warnings
    );

    if geometry::is_empty(&area) {
        let reason = if isolation.is_empty() {
            "boundary fully covered by copper"
        } else {
            "isolation geometry broken, margin smaller than tool diameter"
        };
        return Err(ClearingError::EmptyExtent(reason.to_string()));
    }

    Ok(EmptyArea {
        area,
        isolation: rings,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperkit_core::{ParamOverrides, ToolCatalog, ToolShape};
    use geo::{Coord, Rect};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon {
        geometry::to_multi(
            Rect::new(Coord { x, y }, Coord { x: x + size, y: y + size }).to_polygon(),
        )
    }

    fn tool_id(d: f64) -> ToolId {
        let mut cat = ToolCatalog::default();
        cat.add_tool(d, ToolShape::Flat, &ParamOverrides::default())
            .unwrap()
    }

    #[test]
    fn test_plain_difference() {
        let empty = compute_empty(&square(0.0, 0.0, 10.0), &square(4.0, 4.0, 2.0), &[], None)
            .unwrap();
        assert!((geometry::area(&empty.area) - 96.0).abs() < 1e-6);
        assert_eq!(empty.warnings, 0);
    }

    #[test]
    fn test_copper_offset_grows_keep_out() {
        let plain =
            compute_empty(&square(0.0, 0.0, 10.0), &square(4.0, 4.0, 2.0), &[], None).unwrap();
        let padded = compute_empty(
            &square(0.0, 0.0, 10.0),
            &square(4.0, 4.0, 2.0),
            &[],
            Some(0.5),
        )
        .unwrap();
        assert!(geometry::area(&padded.area) < geometry::area(&plain.area) - 4.0);
    }

    #[test]
    fn test_fully_covered_boundary_fails() {
        let err =
            compute_empty(&square(0.0, 0.0, 10.0), &square(-1.0, -1.0, 12.0), &[], None)
                .unwrap_err();
        assert!(matches!(err, ClearingError::EmptyExtent(_)));
    }

    #[test]
    fn test_isolation_rings_inside_region() {
        let pass = IsolationPass {
            tool: tool_id(1.0),
            diameter: 1.0,
            milling: MillingDirection::Conventional,
        };
        let empty =
            compute_empty(&square(0.0, 0.0, 20.0), &square(8.0, 8.0, 4.0), &[pass], None)
                .unwrap();
        assert_eq!(empty.warnings, 0);
        assert_eq!(empty.isolation.len(), 1);
        assert_eq!(empty.isolation[0].rings.len(), 1);
        assert!(empty.isolation[0].rings[0].is_closed());
        // envelope reaches one diameter out from the copper
        assert!(geometry::area(&empty.area) < 400.0 - 36.0 + 1.0);
    }

    #[test]
    fn test_isolation_broken_when_ring_leaves_region() {
        let pass = IsolationPass {
            tool: tool_id(5.0),
            diameter: 5.0,
            milling: MillingDirection::Climb,
        };
        // copper touching the region edge: rings cannot close inside it
        let copper = union(&[square(2.0, 2.0, 4.0), square(30.0, 30.0, 4.0)]);
        let region = geometry::buffer_mitre(
            &geometry::to_multi(geometry::convex_hull(&copper)),
            3.0,
        );
        let empty = compute_empty(&region, &copper, &[pass], None).unwrap();
        assert_eq!(empty.warnings, 1);
        assert!(empty.isolation[0].broken);
    }

    fn union(parts: &[MultiPolygon]) -> MultiPolygon {
        geometry::union_all(parts.iter().cloned())
    }

    #[test]
    fn test_idempotent() {
        let region = square(0.0, 0.0, 30.0);
        let copper = union(&[square(5.0, 5.0, 3.0), square(15.0, 20.0, 2.0)]);
        let a = compute_empty(&region, &copper, &[], Some(0.2)).unwrap();
        let b = compute_empty(&region, &copper, &[], Some(0.2)).unwrap();
        assert!((geometry::area(&a.area) - geometry::area(&b.area)).abs() < 1e-9);
    }
}
