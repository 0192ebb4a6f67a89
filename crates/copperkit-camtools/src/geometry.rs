//! Geometry capability layer
//!
//! Thin adapter over `geo` (boolean ops, buffers, hulls, line clipping) and
//! `cavalier_contours` (parallel offsets of closed rings). Every operation
//! that produces polygons returns them repaired, oriented (exteriors
//! counter-clockwise) and with zero-area slivers removed, so callers never
//! see raw boolean output.

use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use geo::algorithm::buffer::{BufferStyle, LineJoin};
use geo::algorithm::orient::{Direction, Orient};
use geo::{
    Area, BooleanOps, Buffer, ConvexHull, Coord, LineString, MultiLineString, MultiPolygon,
    Polygon,
};
use std::panic;
use tracing::warn;

/// Polygons and holes smaller than this are slivers.
pub const SLIVER_AREA: f64 = 1e-7;

/// Paths shorter than this are degenerate.
pub const MIN_LENGTH: f64 = 1e-6;

/// Mitre limit used for boundary margins.
const MITRE_LIMIT: f64 = 10.0;

/// Points closer than this are merged when building polylines.
const REPEAT_TOLERANCE: f64 = 1e-5;

/// Segments per full circle when linearising arcs.
const CIRCLE_SEGMENTS: usize = 64;

pub fn empty() -> MultiPolygon {
    MultiPolygon::new(Vec::new())
}

pub fn to_multi(polygon: Polygon) -> MultiPolygon {
    MultiPolygon::new(vec![polygon])
}

pub fn area(mp: &MultiPolygon) -> f64 {
    mp.unsigned_area()
}

/// Whether `mp` has no area worth clearing.
pub fn is_empty(mp: &MultiPolygon) -> bool {
    mp.0.is_empty() || area(mp) <= SLIVER_AREA
}

fn drop_slivers(mp: MultiPolygon) -> MultiPolygon {
    mp.into_iter()
        .filter(|p| p.unsigned_area() > SLIVER_AREA)
        .map(|p| {
            let (exterior, interiors) = p.into_inner();
            let interiors = interiors
                .into_iter()
                .filter(|ring| Polygon::new(ring.clone(), vec![]).unsigned_area() > SLIVER_AREA)
                .collect();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

/// Repair `mp` (self-overlaps, duplicate rings) and drop slivers.
pub fn clean(mp: MultiPolygon) -> MultiPolygon {
    if mp.0.is_empty() {
        return mp;
    }
    let repaired = mp.union(&empty());
    drop_slivers(repaired).orient(Direction::Default)
}

/// Union of many multipolygons, merged pairwise.
pub fn union_all<I>(parts: I) -> MultiPolygon
where
    I: IntoIterator<Item = MultiPolygon>,
{
    let mut layer: Vec<MultiPolygon> = parts.into_iter().filter(|m| !m.0.is_empty()).collect();
    if layer.is_empty() {
        return empty();
    }
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .skip(1)
                    .fold(pair[0].clone(), |acc, next| acc.union(next))
            })
            .collect();
    }
    clean(layer.pop().unwrap_or_else(empty))
}

pub fn difference(a: &MultiPolygon, b: &MultiPolygon) -> MultiPolygon {
    if a.0.is_empty() {
        return empty();
    }
    if b.0.is_empty() {
        return clean(a.clone());
    }
    clean(a.difference(b))
}

pub fn intersection(a: &MultiPolygon, b: &MultiPolygon) -> MultiPolygon {
    if a.0.is_empty() || b.0.is_empty() {
        return empty();
    }
    clean(a.intersection(b))
}

/// Round-joined buffer. Negative distances shrink.
pub fn buffer(mp: &MultiPolygon, distance: f64) -> MultiPolygon {
    if mp.0.is_empty() {
        return empty();
    }
    if distance == 0.0 {
        return clean(mp.clone());
    }
    clean(mp.buffer(distance))
}

/// Mitre-joined buffer, keeps sharp corners sharp.
pub fn buffer_mitre(mp: &MultiPolygon, distance: f64) -> MultiPolygon {
    if mp.0.is_empty() {
        return empty();
    }
    if distance == 0.0 {
        return clean(mp.clone());
    }
    let style = BufferStyle::new(distance).line_join(LineJoin::Miter(MITRE_LIMIT));
    clean(mp.buffer_with_style(style))
}

/// Erode by `width / 2` then grow back, removing parts narrower than `width`.
pub fn open(mp: &MultiPolygon, width: f64) -> MultiPolygon {
    buffer(&buffer(mp, -width / 2.0), width / 2.0)
}

pub fn convex_hull(mp: &MultiPolygon) -> Polygon {
    mp.convex_hull()
}

/// Parts of `lines` inside `area`. Degenerate pieces are dropped.
pub fn clip_lines(lines: &[LineString], area: &MultiPolygon) -> Vec<LineString> {
    if lines.is_empty() || area.0.is_empty() {
        return Vec::new();
    }
    area.clip(&MultiLineString::new(lines.to_vec()), false)
        .0
        .into_iter()
        .filter(|ls| length(ls) > MIN_LENGTH)
        .collect()
}

/// Area covered by a tool of `diameter` following `paths`.
pub fn sweep(paths: &[LineString], diameter: f64) -> MultiPolygon {
    let lines: Vec<LineString> = paths.iter().filter(|p| p.0.len() >= 2).cloned().collect();
    if lines.is_empty() {
        return empty();
    }
    clean(MultiLineString::new(lines).buffer(diameter / 2.0))
}

/// Exterior and interior rings of every polygon.
pub fn rings(mp: &MultiPolygon) -> Vec<LineString> {
    let mut out = Vec::new();
    for poly in mp.iter() {
        out.push(poly.exterior().clone());
        out.extend(poly.interiors().iter().cloned());
    }
    out
}

pub fn length(ls: &LineString) -> f64 {
    ls.0.windows(2).map(|w| distance(w[0], w[1])).sum()
}

pub fn distance(a: Coord, b: Coord) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Closed polyline approximating a circle, counter-clockwise.
pub fn circle(center: Coord, radius: f64) -> LineString {
    let mut coords: Vec<Coord> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            Coord {
                x: center.x + radius * a.cos(),
                y: center.y + radius * a.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);
    LineString::new(coords)
}

/// Drop repeated vertices and the duplicated closing vertex.
pub fn clean_polyline(mut pline: Polyline<f64>) -> Polyline<f64> {
    pline.remove_repeat_pos(REPEAT_TOLERANCE);
    if pline.is_closed() && pline.vertex_count() > 1 {
        let first = pline.at(0).pos();
        let last = pline.at(pline.vertex_count() - 1).pos();
        if (first.x - last.x).abs() < REPEAT_TOLERANCE && (first.y - last.y).abs() < REPEAT_TOLERANCE
        {
            pline.remove_last();
        }
    }
    pline
}

fn ring_to_polyline(ring: &LineString) -> Option<Polyline<f64>> {
    let mut pline = Polyline::new();
    for p in ring.0.iter() {
        pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    pline.set_is_closed(true);
    let pline = clean_polyline(pline);
    (pline.vertex_count() > 2).then_some(pline)
}

/// Linearise a closed polyline, expanding bulge arcs.
fn polyline_to_polygon(pline: &Polyline<f64>) -> Option<Polygon> {
    let count = pline.vertex_count();
    if count < 2 {
        return None;
    }

    let mut coords = Vec::with_capacity(count * 2);
    for i in 0..count {
        let v1 = pline.at(i);
        let v2 = pline.at((i + 1) % count);
        coords.push(Coord { x: v1.x, y: v1.y });

        if v1.bulge.abs() > 1e-5 {
            let theta = 4.0 * v1.bulge.atan();
            let chord_len = ((v2.x - v1.x).powi(2) + (v2.y - v1.y).powi(2)).sqrt();
            if chord_len > 1e-5 {
                let radius = chord_len / (2.0 * (theta / 2.0).sin());
                let dist_to_center = radius.abs() * (theta.abs() / 2.0).cos();
                let nx = -(v2.y - v1.y) / chord_len;
                let ny = (v2.x - v1.x) / chord_len;
                let sign = v1.bulge.signum();
                let cx = (v1.x + v2.x) / 2.0 + nx * dist_to_center * sign;
                let cy = (v1.y + v2.y) / 2.0 + ny * dist_to_center * sign;
                let start = (v1.y - cy).atan2(v1.x - cx);
                let segments = ((theta.abs() / std::f64::consts::TAU) * CIRCLE_SEGMENTS as f64)
                    .ceil()
                    .max(2.0) as usize;
                for j in 1..segments {
                    let angle = start + theta * j as f64 / segments as f64;
                    coords.push(Coord {
                        x: cx + radius.abs() * angle.cos(),
                        y: cy + radius.abs() * angle.sin(),
                    });
                }
            }
        }
    }

    if coords.len() < 3 {
        return None;
    }
    Some(Polygon::new(LineString::new(coords), vec![]))
}

/// Offset one closed ring so its enclosed area grows (`grow`) or shrinks.
///
/// The sign convention of `parallel_offset` depends on winding, so both
/// signs are tried and checked against the original area. `None` means the
/// offset panicked or neither sign behaved.
fn offset_ring(ring: &LineString, distance: f64, grow: bool) -> Option<Vec<Polygon>> {
    let pline = ring_to_polyline(ring)?;
    let original = pline.area().abs();

    for sign in [1.0, -1.0] {
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            pline.parallel_offset(sign * distance)
        }))
        .ok()?;
        let polys: Vec<Polygon> = result.iter().filter_map(polyline_to_polygon).collect();
        let total: f64 = polys.iter().map(|p| p.unsigned_area()).sum();
        if (grow && total > original) || (!grow && total < original) {
            return Some(polys);
        }
    }
    None
}

/// Grow `mp` outward by `distance` using ring parallel offsets.
///
/// Exteriors grow and holes shrink, then the pieces are merged. Falls back
/// to a round buffer when an offset fails.
pub fn offset_outward(mp: &MultiPolygon, distance: f64) -> MultiPolygon {
    if mp.0.is_empty() || distance <= 0.0 {
        return clean(mp.clone());
    }

    let mut grown = Vec::new();
    let mut shrunk = Vec::new();
    for poly in mp.iter() {
        match offset_ring(poly.exterior(), distance, true) {
            Some(parts) => grown.push(MultiPolygon::new(parts)),
            None => {
                warn!("Parallel offset failed, falling back to buffer");
                return buffer(mp, distance);
            }
        }
        for hole in poly.interiors() {
            match offset_ring(hole, distance, false) {
                Some(parts) => shrunk.push(MultiPolygon::new(parts)),
                None => {
                    warn!("Parallel offset of hole failed, falling back to buffer");
                    return buffer(mp, distance);
                }
            }
        }
    }

    difference(&union_all(grown), &union_all(shrunk))
}
