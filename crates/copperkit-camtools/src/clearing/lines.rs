//! Lines strategy: horizontal raster with alternating direction.

use super::{
    connect_area, connect_paths, contour_rings, finish_paths, last_position, pass_step,
    tool_centre_region, ClearOptions, PassStrategy,
};
use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use geo::{BoundingRect, Coord, LineString, Polygon};

/// Rows clipped to the tool-centre region this much grown, so the first and
/// last rows survive clipping when they lie on its edge.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Parallel rows evenly spread over the tool-centre region, at most one
/// step apart, zig-zagging so each row starts where the last one ended.
/// The first and last rows run on the region's bottom and top edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lines;

impl PassStrategy for Lines {
    fn name(&self) -> &'static str {
        "Lines"
    }

    fn clear(
        &self,
        polygon: &Polygon,
        diameter: f64,
        overlap: f64,
        options: &ClearOptions,
    ) -> ClearingResult<Vec<LineString>> {
        let step = pass_step(diameter, overlap)?;
        let region = tool_centre_region(polygon, diameter)?;
        let bbox = region
            .bounding_rect()
            .ok_or(ClearingError::UnclearableGeometry { diameter })?;

        let rows = (bbox.height() / step).ceil().max(1.0) as usize;
        let spacing = bbox.height() / rows as f64;
        let (x0, x1) = (bbox.min().x - diameter, bbox.max().x + diameter);
        let clip = geometry::buffer_mitre(&region, EDGE_TOLERANCE);

        let mut paths = Vec::new();
        for row in 0..=rows {
            let y = bbox.min().y + spacing * row as f64;
            let line = LineString::new(vec![Coord { x: x0, y }, Coord { x: x1, y }]);
            let mut pieces = geometry::clip_lines(&[line], &clip);
            for piece in &mut pieces {
                if let (Some(a), Some(b)) = (piece.0.first(), piece.0.last()) {
                    if a.x > b.x {
                        piece.0.reverse();
                    }
                }
            }
            pieces.sort_by(|a, b| a.0[0].x.total_cmp(&b.0[0].x));
            if row % 2 == 1 {
                pieces.reverse();
                for piece in &mut pieces {
                    piece.0.reverse();
                }
            }
            paths.extend(pieces);
        }

        if options.connect {
            paths = connect_paths(paths, &connect_area(&region, diameter), diameter);
        }

        if options.contour || paths.is_empty() {
            let pos = last_position(&paths, bbox.min());
            paths.extend(contour_rings(&region, pos));
        }

        Ok(finish_paths(paths, options.milling))
    }
}
