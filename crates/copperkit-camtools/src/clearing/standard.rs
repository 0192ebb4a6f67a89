//! Standard strategy: fixed-step inward offsetting.

use super::{
    connect_area, connect_paths, contour_rings, finish_paths, last_position, order_paths,
    pass_step, tool_centre_region, ClearOptions, PassStrategy,
};
use crate::error::ClearingResult;
use crate::geometry;
use geo::{Coord, LineString, Polygon};

/// Guard against runaway offset loops on malformed input.
const MAX_PASSES: usize = 100_000;

/// Concentric inward passes, `step` apart, starting on the tool-centre
/// boundary. `contour` repeats that boundary as a final finishing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl PassStrategy for Standard {
    fn name(&self) -> &'static str {
        "Standard"
    }

    fn clear(
        &self,
        polygon: &Polygon,
        diameter: f64,
        overlap: f64,
        options: &ClearOptions,
    ) -> ClearingResult<Vec<LineString>> {
        let step = pass_step(diameter, overlap)?;
        let base = tool_centre_region(polygon, diameter)?;

        let mut passes = geometry::rings(&base);
        let mut innermost = base.clone();
        for k in 1..MAX_PASSES {
            let next = geometry::buffer(&base, -step * k as f64);
            if geometry::is_empty(&next) {
                break;
            }
            passes.extend(geometry::rings(&next));
            innermost = next;
        }

        // material deeper than one radius inside the innermost pass
        let core = geometry::buffer(&innermost, -diameter / 2.0);
        if !geometry::is_empty(&core) {
            passes.extend(geometry::rings(&core));
        }

        let start = base
            .0
            .first()
            .and_then(|p| p.exterior().0.first().copied())
            .unwrap_or(Coord { x: 0.0, y: 0.0 });
        let mut paths = order_paths(passes, start);
        if options.connect {
            paths = connect_paths(paths, &connect_area(&base, diameter), diameter);
        }

        if options.contour || paths.is_empty() {
            let pos = last_position(&paths, start);
            paths.extend(contour_rings(&base, pos));
        }

        Ok(finish_paths(paths, options.milling))
    }
}
